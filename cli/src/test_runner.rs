use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use frames::{CaretPosition, ChangeEvent, Direction, DocumentState, FrameId, FrameKind, Placement};
use session::{Session, SessionConfig, SessionError, SlotDirection};

use tracing::{debug, warn};

use crate::describe;

const SCENARIO_SUFFIX: &str = ".test.toml";

/// One session operation in a scenario, selected by its `op` key.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Action {
    /// Insert into `parent`'s body, or into `primary`'s joint chain. With
    /// neither, the frame goes into the main container.
    Insert {
        kind: FrameKind,
        #[serde(default)]
        parent: Option<FrameId>,
        #[serde(default)]
        primary: Option<FrameId>,
        #[serde(default)]
        index: Option<usize>,
    },
    Reorder {
        parent: FrameId,
        event: ChangeEvent,
    },
    Move {
        frame: FrameId,
        parent: FrameId,
        index: usize,
    },
    MoveJoint {
        primary: FrameId,
        from: usize,
        to: usize,
    },
    Delete {
        frame: FrameId,
    },
    SetSlot {
        frame: FrameId,
        slot: usize,
        code: String,
    },
    Focus {
        frame: FrameId,
        slot: usize,
    },
    ToggleLabel {
        frame: FrameId,
        slot: usize,
    },
    Disable {
        frame: FrameId,
        #[serde(default = "default_true")]
        disabled: bool,
    },
    Caret {
        direction: Direction,
    },
    PlaceCaret {
        frame: FrameId,
        position: CaretPosition,
    },
    Slot {
        direction: SlotDirection,
    },
    ToggleEditing,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,

    /// The step must fail with an error whose message contains this substring.
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedCaret {
    pub frame: FrameId,
    pub position: CaretPosition,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// JSON document to start from, relative to the test file. Defaults to
    /// the empty document.
    #[serde(default)]
    pub document: Option<PathBuf>,

    /// Session settings for this scenario. Defaults to the CLI's `--config`.
    #[serde(default)]
    pub session: Option<SessionConfig>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,

    /// Expected outline after the last step (trimmed comparison).
    #[serde(default)]
    pub expect_outline: Option<String>,

    #[serde(default)]
    pub expect_caret: Option<ExpectedCaret>,

    #[serde(default)]
    pub expect_next_id: Option<u32>,

    #[serde(default)]
    pub expect_editing: Option<bool>,
}

/// The result of one scenario file. `failure` is `None` when it passed.
struct Report {
    path: PathBuf,
    description: Option<String>,
    failure: Option<String>,
}

impl Report {
    fn name(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(SCENARIO_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn apply(session: &mut Session, action: &Action) -> Result<(), SessionError> {
    match action {
        Action::Insert {
            kind,
            parent,
            primary,
            index,
        } => {
            let placement = match (parent, primary) {
                (_, Some(primary)) => Placement::Joint {
                    primary: *primary,
                    index: *index,
                },
                (Some(parent), None) => Placement::Body {
                    parent: *parent,
                    index: *index,
                },
                (None, None) => Placement::Body {
                    parent: session
                        .tree()
                        .container(FrameKind::MainContainer)
                        .unwrap_or(FrameId::ROOT),
                    index: *index,
                },
            };
            session.insert_frame(placement, *kind).map(|_| ())
        }
        Action::Reorder { parent, event } => session.reorder(*parent, *event).map(|_| ()),
        Action::Move { frame, parent, index } => session.move_frame(*frame, *parent, *index),
        Action::MoveJoint { primary, from, to } => session.move_joint_frame(*primary, *from, *to),
        Action::Delete { frame } => session.delete_frame(*frame).map(|_| ()),
        Action::SetSlot { frame, slot, code } => {
            session.set_slot_content(*frame, *slot, code.as_str())
        }
        Action::Focus { frame, slot } => session.focus_slot(*frame, *slot),
        Action::ToggleLabel { frame, slot } => session.toggle_slot_label(*frame, *slot).map(|_| ()),
        Action::Disable { frame, disabled } => session.set_disabled(*frame, *disabled),
        Action::Caret { direction } => session.move_caret(*direction).map(|_| ()),
        Action::PlaceCaret { frame, position } => {
            session.place_caret(*frame, *position).map(|_| ())
        }
        Action::Slot { direction } => session.move_slot_focus(*direction),
        Action::ToggleEditing => session.toggle_editing_mode().map(|_| ()),
    }
}

fn open_session(
    path: &Path,
    config: &TestConfig,
    default: SessionConfig,
) -> Result<Session, String> {
    let session_config = config.session.unwrap_or(default);
    let Some(document) = &config.document else {
        return Ok(Session::new(session_config));
    };
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let document_path = base_dir.join(document);
    let source = std::fs::read_to_string(&document_path)
        .map_err(|e| format!("cannot read document {}: {}", document_path.display(), e))?;
    let state = DocumentState::from_json(&source)
        .map_err(|e| format!("document {} is not valid: {}", document_path.display(), e))?;
    Session::from_state(state, session_config).map_err(|e| describe(&e))
}

/// Run every step, then check the expectations. Returns `Some(reason)` on
/// failure.
fn run_scenario(path: &Path, config: &TestConfig, default: SessionConfig) -> Option<String> {
    let mut session = match open_session(path, config, default) {
        Ok(session) => session,
        Err(reason) => return Some(reason),
    };

    for (i, step) in config.steps.iter().enumerate() {
        let result = apply(&mut session, &step.action);
        match (&step.expect_error, result) {
            (None, Ok(())) => {}
            (None, Err(error)) => {
                return Some(format!(
                    "step[{}] {:?}: unexpected error: {}",
                    i,
                    step.action,
                    describe(&error)
                ));
            }
            (Some(expected), Ok(())) => {
                return Some(format!(
                    "step[{}] {:?}: expected error containing \"{}\", but it succeeded",
                    i, step.action, expected
                ));
            }
            (Some(expected), Err(error)) => {
                let message = describe(&error);
                if !message.contains(expected.as_str()) {
                    return Some(format!(
                        "step[{}]: expected error containing \"{}\", got: {}",
                        i, expected, message
                    ));
                }
            }
        }
    }

    if let Err(error) = session.tree().check_invariants() {
        return Some(format!("tree invariants broken: {}", error));
    }

    if let Some(expected) = &config.expect_outline {
        let actual = session.tree().outline();
        if actual.trim() != expected.trim() {
            return Some(format!(
                "outline mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected.trim()),
                indent(actual.trim())
            ));
        }
    }

    if let Some(expected) = &config.expect_caret {
        let actual = session.caret();
        if actual.id != expected.frame || actual.position != expected.position {
            return Some(format!(
                "caret mismatch\n  expected: {} {:?}\n  actual:   {} {:?}",
                expected.frame, expected.position, actual.id, actual.position
            ));
        }
    }

    if let Some(expected) = config.expect_next_id {
        let actual = session.tree().next_available_id();
        if actual != FrameId(expected) {
            return Some(format!("expected next id {}, got {}", expected, actual));
        }
    }

    if let Some(expected) = config.expect_editing
        && session.is_editing() != expected
    {
        return Some(format!("expected editing = {}, got {}", expected, session.is_editing()));
    }

    None
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}", line)).collect::<Vec<_>>().join("\n")
}

fn run_file(path: &Path, default: SessionConfig) -> Report {
    debug!(path = %path.display(), "running scenario");
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read scenario: {}", e))
        .and_then(|content| {
            toml::from_str::<TestConfig>(content.trim_start_matches('\u{feff}'))
                .map_err(|e| format!("scenario is not valid TOML: {}", e))
        });
    match parsed {
        Ok(config) => Report {
            path: path.to_path_buf(),
            failure: run_scenario(path, &config, default),
            description: config.description,
        },
        Err(reason) => Report {
            path: path.to_path_buf(),
            description: None,
            failure: Some(reason),
        },
    }
}

/// Scenario files under `root`, keyed by the folder they sit in relative to
/// `root` ("" for files directly inside it). A single file is its own group.
fn scenario_groups(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        groups.entry(String::new()).or_default().push(root.to_path_buf());
        return groups;
    }
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            warn!(dir = %dir.display(), "cannot read scenario folder");
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_scenario = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(SCENARIO_SUFFIX));
            if is_scenario {
                groups.entry(group_name(root, &path)).or_default().push(path);
            }
        }
    }
    for files in groups.values_mut() {
        files.sort();
    }
    groups
}

fn group_name(root: &Path, file: &Path) -> String {
    file.parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn display_group(name: &str) -> &str {
    if name.is_empty() { "(top level)" } else { name }
}

/// Keep the groups named by `wanted`, or nested below one of them.
fn select_groups<'a>(
    groups: &'a BTreeMap<String, Vec<PathBuf>>,
    wanted: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if wanted.is_empty() {
        return groups.iter().map(|(name, files)| (name.as_str(), files.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for name in wanted {
        let name = name.trim_matches('/');
        let nested = format!("{}/", name);
        let before = selected.len();
        for (group, files) in groups {
            if group == name || group.starts_with(&nested) {
                selected.insert(group.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            warn!(category = name, "no scenarios in this category");
        }
    }
    selected
}

/// Print the scenario categories below `path` with their sizes.
pub fn list_categories(path: &Path) {
    let groups = scenario_groups(path);
    if groups.is_empty() {
        eprintln!("no scenarios under {}", path.display());
        return;
    }
    for (name, files) in &groups {
        eprintln!("{:<24} {} scenario(s)", display_group(name), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run the scenarios at `path` (a file or a folder), optionally limited to
/// some categories. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String], config: SessionConfig) -> i32 {
    let groups = scenario_groups(path);
    let selected = select_groups(&groups, categories);
    if selected.is_empty() {
        eprintln!("no scenarios to run under {}", path.display());
        return 1;
    }

    let mut reports = Vec::new();
    for (name, files) in selected {
        eprintln!("{}", paint(display_group(name), "1", no_color));
        for file in files {
            let report = run_file(file, config);
            let status = match report.failure {
                None => paint("PASS", "32", no_color),
                Some(_) => paint("FAIL", "31", no_color),
            };
            eprintln!("  {}  {}", status, report.name());
            reports.push(report);
        }
    }

    let failed: Vec<&Report> = reports.iter().filter(|report| report.failure.is_some()).collect();
    for report in &failed {
        eprintln!();
        eprintln!("{}:", report.path.display());
        for line in report.failure.iter().flat_map(|reason| reason.lines()) {
            eprintln!("  {}", line);
        }
    }

    let passed = reports.len() - failed.len();
    eprintln!();
    if failed.is_empty() {
        eprintln!("{} scenario(s) passed", passed);
        0
    } else {
        let summary = format!("{} of {} scenario(s) failed", failed.len(), reports.len());
        eprintln!("{}", paint(&summary, "31", no_color));
        1
    }
}
