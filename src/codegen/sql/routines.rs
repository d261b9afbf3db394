use super::terminate;
use crate::schema::{FunctionDefinition, TriggerDefinition};

pub fn render_functions(functions: &[FunctionDefinition]) -> String {
    if functions.is_empty() {
        return "-- No functions\n".to_string();
    }
    let blocks: Vec<String> = functions
        .iter()
        .map(|f| format!("-- Function: {}\n{}\n", f.name, terminate(&f.definition_text)))
        .collect();
    blocks.join("\n")
}

pub fn render_triggers(triggers: &[TriggerDefinition]) -> String {
    if triggers.is_empty() {
        return "-- No triggers\n".to_string();
    }
    let blocks: Vec<String> = triggers
        .iter()
        .map(|t| {
            format!(
                "-- Trigger: {} on {}\n{}\n",
                t.name,
                t.table,
                terminate(&t.definition_text)
            )
        })
        .collect();
    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_functions_are_terminated() {
        let functions = vec![
            FunctionDefinition {
                name: "touch".to_string(),
                definition_text: "CREATE OR REPLACE FUNCTION public.touch()\n RETURNS trigger\n LANGUAGE plpgsql\nAS $function$\nBEGIN\n  NEW.updated_at = now();\n  RETURN NEW;\nEND;\n$function$\n".to_string(),
            },
            FunctionDefinition {
                name: "one".to_string(),
                definition_text: "CREATE FUNCTION one() RETURNS int AS 'SELECT 1' LANGUAGE sql;".to_string(),
            },
        ];
        let expected = indoc! {"
            -- Function: touch
            CREATE OR REPLACE FUNCTION public.touch()
             RETURNS trigger
             LANGUAGE plpgsql
            AS $function$
            BEGIN
              NEW.updated_at = now();
              RETURN NEW;
            END;
            $function$;

            -- Function: one
            CREATE FUNCTION one() RETURNS int AS 'SELECT 1' LANGUAGE sql;
        "};
        assert_eq!(render_functions(&functions), expected);
        assert_eq!(render_functions(&[]), "-- No functions\n");
    }

    #[test]
    fn test_trigger_comment_names_table() {
        let triggers = vec![TriggerDefinition {
            name: "users_touch".to_string(),
            table: "users".to_string(),
            definition_text: "CREATE TRIGGER users_touch BEFORE UPDATE ON public.users FOR EACH ROW EXECUTE FUNCTION touch()".to_string(),
        }];
        insta::assert_snapshot!(
            render_triggers(&triggers).trim_end(),
            @r"
        -- Trigger: users_touch on users
        CREATE TRIGGER users_touch BEFORE UPDATE ON public.users FOR EACH ROW EXECUTE FUNCTION touch();
        "
        );
    }
}
