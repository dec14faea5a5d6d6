//! Property-based tests using proptest
//!
//! These pin the framework's string laws under randomized input: the
//! confirmation suffix rule, command variable expansion, and column
//! fitting.

use awscope::framework::action::{confirm_matches, confirm_suffix};
use awscope::framework::command::{expand_variables, UNSAFE_CHARS};
use awscope::framework::render::{fit_columns, Column};
use awscope::framework::resource::JsonResource;
use proptest::prelude::*;
use serde_json::json;

fn resource(id: &str, name: &str) -> JsonResource {
    JsonResource::new(json!({"id": id, "name": name}), "id", "name", "")
}

mod confirmation_laws {
    use super::*;

    proptest! {
        /// Tokens of at most six characters are retyped in full.
        #[test]
        fn short_tokens_are_identity(token in "[a-zA-Z0-9:-]{1,6}") {
            prop_assert_eq!(confirm_suffix(&token), token);
        }

        /// Longer tokens require exactly their last six characters.
        #[test]
        fn long_tokens_take_the_last_six(token in "[a-zA-Z0-9:-]{7,40}") {
            let suffix = confirm_suffix(&token);
            prop_assert_eq!(suffix.chars().count(), 6);
            prop_assert!(token.ends_with(&suffix));
        }

        /// confirm_matches is exactly equality with the derived suffix.
        #[test]
        fn matches_is_suffix_equality(
            token in "[a-zA-Z0-9:-]{0,40}",
            input in "[a-zA-Z0-9:-]{0,40}"
        ) {
            prop_assert_eq!(
                confirm_matches(&token, &input),
                input == confirm_suffix(&token)
            );
        }

        /// Typing the full token never confirms when a suffix is expected.
        #[test]
        fn full_token_is_rejected_for_long_tokens(token in "[a-zA-Z0-9:-]{7,40}") {
            prop_assert!(!confirm_matches(&token, &token));
        }
    }

    #[test]
    fn instance_id_examples() {
        assert!(confirm_matches("i-1234567890abcdef0", "bcdef0"));
        assert!(!confirm_matches("i-1234567890abcdef0", "i-1234567890abcdef0"));
        assert_eq!(confirm_suffix(""), "CONFIRM");
    }
}

mod expansion_laws {
    use super::*;

    fn safe_value() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9._/:-]{1,30}".prop_map(|s| s)
    }

    fn unsafe_value() -> impl Strategy<Value = String> {
        (
            "[a-zA-Z0-9._-]{0,10}",
            prop::sample::select(UNSAFE_CHARS.to_vec()),
            "[a-zA-Z0-9._-]{0,10}",
        )
            .prop_map(|(prefix, c, suffix)| format!("{}{}{}", prefix, c, suffix))
    }

    proptest! {
        /// Safe values substitute literally.
        #[test]
        fn safe_values_substitute(id in safe_value()) {
            let r = resource(&id, "name");
            let out = expand_variables("echo ${ID}", &r).unwrap();
            prop_assert_eq!(out, format!("echo {}", id));
        }

        /// Referenced unsafe values fail closed.
        #[test]
        fn referenced_unsafe_values_fail(id in unsafe_value()) {
            let r = resource(&id, "name");
            prop_assert!(expand_variables("echo ${ID}", &r).is_err(), "referenced unsafe value must fail closed");
        }

        /// An unsafe value the command never references is tolerated.
        #[test]
        fn unreferenced_unsafe_values_are_ignored(
            id in safe_value(),
            name in unsafe_value()
        ) {
            let r = resource(&id, &name);
            let out = expand_variables("echo ${ID}", &r).unwrap();
            prop_assert_eq!(out, format!("echo {}", id));
        }

        /// Unknown placeholders pass through untouched.
        #[test]
        fn unknown_placeholders_stay_literal(var in "[A-Z_]{1,12}") {
            prop_assume!(var != "ID" && var != "NAME" && var != "ARN");
            let r = resource("safe-id", "safe-name");
            let template = format!("echo ${{{}}}", var);
            let out = expand_variables(&template, &r).unwrap();
            prop_assert_eq!(out, template);
        }

        /// Commands with no placeholders are returned unchanged no
        /// matter what the resource holds.
        #[test]
        fn placeholder_free_commands_are_unchanged(
            cmd in "[a-zA-Z0-9 ._/-]{0,40}",
            id in unsafe_value()
        ) {
            let r = resource(&id, "name");
            prop_assert_eq!(expand_variables(&cmd, &r).unwrap(), cmd);
        }
    }
}

mod column_fitting {
    use super::*;

    fn id_getter(r: &dyn awscope::framework::resource::Resource) -> String {
        r.id().to_string()
    }

    fn arb_columns() -> impl Strategy<Value = Vec<(u16, u8)>> {
        prop::collection::vec((2u16..40, 0u8..8), 1..10)
    }

    proptest! {
        /// Fitting keeps at least one column, keeps original order, and
        /// never invents indices.
        #[test]
        fn fit_is_sane(specs in arb_columns(), width in 5u16..200) {
            let columns: Vec<Column> = specs
                .iter()
                .map(|&(w, p)| Column::new("col", w, p, id_getter))
                .collect();

            let kept = fit_columns(&columns, width);
            prop_assert!(!kept.is_empty());
            prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(kept.iter().all(|&i| i < columns.len()));
        }

        /// When more than one column survives, their widths fit.
        #[test]
        fn kept_columns_fit_or_are_a_single_column(
            specs in arb_columns(),
            width in 5u16..200
        ) {
            let columns: Vec<Column> = specs
                .iter()
                .map(|&(w, p)| Column::new("col", w, p, id_getter))
                .collect();

            let kept = fit_columns(&columns, width);
            if kept.len() > 1 {
                let total: u32 = kept.iter().map(|&i| columns[i].width as u32 + 1).sum();
                prop_assert!(total <= width as u32);
            }
        }

        /// A wide enough terminal keeps every column.
        #[test]
        fn wide_terminals_keep_everything(specs in arb_columns()) {
            let columns: Vec<Column> = specs
                .iter()
                .map(|&(w, p)| Column::new("col", w, p, id_getter))
                .collect();
            let total: u32 = columns.iter().map(|c| c.width as u32 + 1).sum();

            let kept = fit_columns(&columns, total.min(u16::MAX as u32) as u16);
            prop_assert_eq!(kept.len(), columns.len());
        }
    }
}
