//! Replay logs: recorded tool emissions driven through an aggregator.
//!
//! A replay log is a JSON Lines file. Each line holds one operation tagged
//! by `"op"`, for example:
//!
//! ```text
//! {"op": "set_group", "group": 1}
//! {"op": "explain", "message": "Unused variable", "line": 3}
//! {"op": "hook", "event": "source.next_section", "then": [{"op": "set_success"}]}
//! {"op": "fire", "event": "source.next_section"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::aggregator::{Aggregator, GroupOrder, Remark, SuppressedLabel, SuppressionScope};
use crate::error::{FeedbackError, Result};
use crate::models::{FeedbackFields, GroupId, Priority};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// Message arguments shared by the remark-style operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemarkArgs {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<&RemarkArgs> for Remark {
    fn from(args: &RemarkArgs) -> Self {
        Remark {
            message: args.message.clone(),
            line: args.line,
            group: args.group.clone(),
            label: args.label.clone(),
        }
    }
}

/// One recorded aggregator operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Clear,
    SetGroup {
        #[serde(default)]
        group: Option<GroupId>,
    },
    NameGroup {
        group: GroupId,
        name: String,
    },
    GroupOrder {
        groups: Vec<GroupId>,
    },
    SetSuccess {
        #[serde(default)]
        group: Option<GroupId>,
    },
    GivePartial {
        #[serde(default)]
        value: Option<f64>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        group: Option<GroupId>,
    },
    Explain {
        message: String,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        line: Option<usize>,
        #[serde(default)]
        group: Option<GroupId>,
        #[serde(default)]
        label: Option<String>,
    },
    Gently(RemarkArgs),
    Guidance(RemarkArgs),
    Compliment(RemarkArgs),
    Attach {
        label: String,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        group: Option<GroupId>,
        #[serde(default)]
        result: Option<bool>,
        #[serde(default)]
        performance: Option<f64>,
        #[serde(default)]
        mistake: Option<String>,
        /// Tool-specific fields.
        #[serde(default)]
        fields: BTreeMap<String, Value>,
    },
    Suppress {
        category: String,
        /// Absent means the whole category.
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        scope: Option<GroupId>,
    },
    HideCorrectness,
    Store {
        tool: String,
        value: Value,
    },
    Log {
        message: String,
    },
    /// Register a callback that replays `then` when `event` fires.
    Hook {
        event: String,
        then: Vec<Operation>,
    },
    Fire {
        event: String,
    },
}

/// Counters for a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub logs: usize,
    pub operations: usize,
}

/// Apply one operation to the aggregator.
///
/// Errors come only from hook execution and are returned unchanged.
pub fn apply(agg: &mut Aggregator, op: &Operation) -> anyhow::Result<()> {
    match op {
        Operation::Clear => agg.clear(),
        Operation::SetGroup { group } => {
            agg.set_group(group.clone());
        }
        Operation::NameGroup { group, name } => agg.name_group(group.clone(), name),
        Operation::GroupOrder { groups } => {
            agg.set_group_order(GroupOrder::Explicit(groups.clone()))
        }
        Operation::SetSuccess { group } => match group {
            Some(group) => agg.set_success_in(group.clone()),
            None => agg.set_success(),
        },
        Operation::GivePartial {
            value,
            message,
            group,
        } => {
            let recorded = match group {
                Some(group) => agg.give_partial_in(*value, message.as_deref(), group.clone()),
                None => agg.give_partial(*value, message.as_deref()),
            };
            if !recorded {
                debug!("Partial credit skipped: no value");
            }
        }
        Operation::Explain {
            message,
            priority,
            line,
            group,
            label,
        } => {
            let remark = Remark {
                message: message.clone(),
                line: *line,
                group: group.clone(),
                label: label.clone(),
            };
            agg.explain_with(remark, priority.clone().unwrap_or(Priority::Medium));
        }
        Operation::Gently(args) => agg.gently(Remark::from(args)),
        Operation::Guidance(args) => agg.guidance(Remark::from(args)),
        Operation::Compliment(args) => agg.compliment(Remark::from(args)),
        Operation::Attach {
            label,
            priority,
            category,
            group,
            result,
            performance,
            mistake,
            fields,
        } => {
            let fields = FeedbackFields {
                priority: priority.clone(),
                category: category.clone(),
                group: group.clone(),
                result: *result,
                performance: *performance,
                mistake: mistake.clone(),
                extra: fields.clone(),
                ..Default::default()
            };
            agg.attach(label, fields);
        }
        Operation::Suppress {
            category,
            label,
            scope,
        } => {
            let label = SuppressedLabel::from(label.as_deref());
            match scope {
                Some(group) => {
                    agg.suppress_scoped(category, label, SuppressionScope::Group(group.clone()))
                }
                None => agg.suppress(category, label),
            }
        }
        Operation::HideCorrectness => agg.hide_correctness(),
        Operation::Store { tool, value } => agg.set(tool, value.clone()),
        Operation::Log { message } => agg.log(message),
        Operation::Hook { event, then } => {
            let then = Rc::new(then.clone());
            agg.add_hook(event, move |agg| replay(agg, &then).map(|_| ()));
        }
        Operation::Fire { event } => agg.execute_hooks(event)?,
    }

    Ok(())
}

/// Apply operations in order, stopping at the first failure.
///
/// Returns the number of operations applied.
pub fn replay(agg: &mut Aggregator, ops: &[Operation]) -> anyhow::Result<usize> {
    for op in ops {
        apply(agg, op)?;
    }
    Ok(ops.len())
}

/// Parse the contents of a replay log.
pub fn parse_log(content: &str) -> Result<Vec<Operation>> {
    let mut ops = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let op = serde_json::from_str(trimmed).map_err(|source| FeedbackError::LogParse {
            line: index + 1,
            source,
        })?;
        ops.push(op);
    }

    Ok(ops)
}

/// Read and parse a replay log from disk.
pub fn load_log(path: &Path) -> Result<Vec<Operation>> {
    let content = std::fs::read_to_string(path).map_err(|source| FeedbackError::LogRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_log(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
# A small run with two sections
{"op": "name_group", "group": 1, "name": "Part One"}
{"op": "set_group", "group": 1}
{"op": "explain", "message": "Unused variable", "line": 3}
{"op": "give_partial", "value": 0.5, "message": "Half the tests pass"}
{"op": "set_group"}
{"op": "guidance", "message": "Read the prompt again"}
{"op": "suppress", "category": "Instructions", "label": "Guidance"}
{"op": "store", "tool": "parser", "value": {"lines": 12}}
"#;

    #[test]
    fn test_parse_log_skips_comments_and_blanks() {
        let ops = parse_log(SAMPLE).unwrap();
        assert_eq!(ops.len(), 8);
        assert_eq!(
            ops[0],
            Operation::NameGroup {
                group: GroupId::Index(1),
                name: "Part One".to_string()
            }
        );
        assert_eq!(ops[4], Operation::SetGroup { group: None });
    }

    #[test]
    fn test_parse_log_reports_line() {
        let content = "{\"op\": \"clear\"}\n\n{\"op\": \"explode\"}\n";
        match parse_log(content) {
            Err(FeedbackError::LogParse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_remark_variants() {
        let ops = parse_log(
            r#"{"op": "gently", "message": "Try again", "label": "retry"}
{"op": "compliment", "message": "Nice", "group": "intro"}"#,
        )
        .unwrap();
        assert_eq!(
            ops[0],
            Operation::Gently(RemarkArgs {
                message: "Try again".to_string(),
                line: None,
                group: None,
                label: Some("retry".to_string()),
            })
        );
        assert!(matches!(ops[1], Operation::Compliment(ref args) if args.group == Some("intro".into())));
    }

    #[test]
    fn test_replay_sample() {
        let ops = parse_log(SAMPLE).unwrap();
        let mut agg = Aggregator::new();
        assert_eq!(replay(&mut agg, &ops).unwrap(), 8);

        let items = agg.feedback();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].group, Some(GroupId::Index(1)));
        assert_eq!(items[1].performance, Some(0.5));
        assert_eq!(items[2].group, None);
        assert_eq!(agg.group_name(&GroupId::Index(1)), Some("Part One"));
        assert!(agg.suppressions().is_suppressed("instructions", "guidance"));
        assert_eq!(agg.peek("parser"), Some(&json!({"lines": 12})));
    }

    #[test]
    fn test_give_partial_without_value_is_skipped() {
        let ops = parse_log(r#"{"op": "give_partial", "message": "no value"}"#).unwrap();
        let mut agg = Aggregator::new();
        replay(&mut agg, &ops).unwrap();
        assert!(agg.feedback().is_empty());
    }

    #[test]
    fn test_attach_with_fields() {
        let ops = parse_log(
            r#"{"op": "attach", "label": "runtime_error", "category": "runtime", "priority": "high", "fields": {"traceback": "line 3"}}"#,
        )
        .unwrap();
        let mut agg = Aggregator::new();
        agg.set_group(Some("main".into()));
        replay(&mut agg, &ops).unwrap();

        let item = &agg.feedback()[0];
        assert_eq!(item.label, "runtime_error");
        assert_eq!(item.priority, Some(Priority::High));
        assert_eq!(item.group, Some("main".into()));
        assert_eq!(item.extra.get("traceback"), Some(&json!("line 3")));
    }

    #[test]
    fn test_hook_operations() {
        let ops = parse_log(
            r#"{"op": "hook", "event": "source.next_section", "then": [{"op": "explain", "message": "checked"}]}
{"op": "hook", "event": "source.next_section", "then": [{"op": "set_success"}]}
{"op": "fire", "event": "source.next_section"}
{"op": "fire", "event": "nobody.listens"}"#,
        )
        .unwrap();
        let mut agg = Aggregator::new();
        replay(&mut agg, &ops).unwrap();

        let labels: Vec<_> = agg.feedback().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["explain", "set_success"]);
    }

    #[test]
    fn test_hook_cycle_fails() {
        let ops = parse_log(
            r#"{"op": "hook", "event": "loop", "then": [{"op": "fire", "event": "loop"}]}
{"op": "fire", "event": "loop"}
{"op": "set_success"}"#,
        )
        .unwrap();
        let mut agg = Aggregator::new();
        agg.set_max_hook_depth(Some(3));

        let err = replay(&mut agg, &ops).unwrap_err();
        assert!(err.downcast_ref::<FeedbackError>().is_some());
        assert!(agg.feedback().is_empty());
    }

    #[test]
    fn test_scoped_suppress_and_hide_correctness() {
        let ops = parse_log(
            r#"{"op": "suppress", "category": "runtime", "scope": 2}
{"op": "hide_correctness"}"#,
        )
        .unwrap();
        let mut agg = Aggregator::new();
        replay(&mut agg, &ops).unwrap();

        assert_eq!(
            agg.suppressions().labels("runtime"),
            Some(&[SuppressedLabel::All][..])
        );
        assert!(agg.suppressions().hides_correctness());
    }

    #[test]
    fn test_load_log_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jsonl");
        assert!(matches!(
            load_log(&missing),
            Err(FeedbackError::LogRead { .. })
        ));
    }

    #[test]
    fn test_load_log_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(load_log(&path).unwrap().len(), 8);
    }

    #[test]
    fn test_replay_recorded_fixture() {
        let ops = parse_log(include_str!("../../fixtures/session.jsonl")).unwrap();
        let mut agg = Aggregator::new();
        assert_eq!(replay(&mut agg, &ops).unwrap(), 20);

        assert_eq!(agg.feedback().len(), 7);
        assert_eq!(agg.hook_count("source.next_section"), 1);
        assert!(agg.contains("tracer"));
        assert!(agg.contains("parser"));
        assert_eq!(agg.group(), None);

        let resolved = crate::report::resolve(&agg);
        let titles: Vec<_> = resolved.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["General", "Computing totals", "Reading input", "Style"]
        );
        assert_eq!(resolved.suppressed, 1);
        assert!(!resolved.success);
        assert_eq!(resolved.score, Some(0.5));
    }
}
