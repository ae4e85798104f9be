pub mod definitions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Every frame type the editor knows about.
///
/// The identifier strings (see [`FrameKind::as_str`]) are what persisted
/// documents store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FrameKind {
    // Structural containers
    Root,
    ImportsContainer,
    FuncDefsContainer,
    MainContainer,

    // Blocks
    FuncDef,
    If,
    Elif,
    Else,
    For,
    While,
    Try,
    Except,
    Finally,
    With,

    // Statements
    Import,
    Break,
    Continue,
    Raise,
    Return,
    VarAssign,
    Comment,
    /// A bare expression, usually a function call.
    Empty,
}

impl FrameKind {
    pub const ALL: &'static [FrameKind] = &[
        FrameKind::Root,
        FrameKind::ImportsContainer,
        FrameKind::FuncDefsContainer,
        FrameKind::MainContainer,
        FrameKind::FuncDef,
        FrameKind::If,
        FrameKind::Elif,
        FrameKind::Else,
        FrameKind::For,
        FrameKind::While,
        FrameKind::Try,
        FrameKind::Except,
        FrameKind::Finally,
        FrameKind::With,
        FrameKind::Import,
        FrameKind::Break,
        FrameKind::Continue,
        FrameKind::Raise,
        FrameKind::Return,
        FrameKind::VarAssign,
        FrameKind::Comment,
        FrameKind::Empty,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameKind::Root => "root",
            FrameKind::ImportsContainer => "importsContainer",
            FrameKind::FuncDefsContainer => "funcDefsContainer",
            FrameKind::MainContainer => "mainContainer",
            FrameKind::FuncDef => "funcdef",
            FrameKind::If => "if",
            FrameKind::Elif => "elif",
            FrameKind::Else => "else",
            FrameKind::For => "for",
            FrameKind::While => "while",
            FrameKind::Try => "try",
            FrameKind::Except => "except",
            FrameKind::Finally => "finally",
            FrameKind::With => "with",
            FrameKind::Import => "import",
            FrameKind::Break => "break",
            FrameKind::Continue => "continue",
            FrameKind::Raise => "raise",
            FrameKind::Return => "return",
            FrameKind::VarAssign => "varassign",
            FrameKind::Comment => "comment",
            FrameKind::Empty => "empty",
        }
    }

    pub fn definition(self) -> &'static FrameTypeDefinition {
        definitions::definition_for(self)
    }

    /// The root and the three top-level containers. These are fixed structure.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            FrameKind::Root
                | FrameKind::ImportsContainer
                | FrameKind::FuncDefsContainer
                | FrameKind::MainContainer
        )
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameKind {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FrameKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FrameError::UnknownFrameType(s.to_string()))
    }
}

impl TryFrom<String> for FrameKind {
    type Error = FrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FrameKind> for &'static str {
    fn from(kind: FrameKind) -> Self {
        kind.as_str()
    }
}

/// Families of frames that may be dragged into each other's bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraggableGroup {
    Imports,
    Code,
    FunctionSignatures,
    IfCompound,
    TryCompound,
    None,
}

impl fmt::Display for DraggableGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraggableGroup::Imports => "imports",
            DraggableGroup::Code => "code",
            DraggableGroup::FunctionSignatures => "functionSignatures",
            DraggableGroup::IfCompound => "ifCompound",
            DraggableGroup::TryCompound => "tryCompound",
            DraggableGroup::None => "none",
        };
        f.write_str(name)
    }
}

/// One piece of a frame's label template: fixed text, optionally followed by
/// an editable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLabel {
    pub label: &'static str,
    pub slot: bool,
    /// Placeholder shown while the slot is empty.
    pub default_text: &'static str,
    pub optional_slot: bool,
    /// The label (and its slot) can be toggled on and off by the user.
    pub optional_label: bool,
    pub accepts_completion: bool,
}

impl FrameLabel {
    pub const fn text(label: &'static str) -> Self {
        FrameLabel {
            label,
            slot: false,
            default_text: "",
            optional_slot: false,
            optional_label: false,
            accepts_completion: false,
        }
    }

    pub const fn slot(label: &'static str, default_text: &'static str) -> Self {
        FrameLabel {
            label,
            slot: true,
            default_text,
            optional_slot: false,
            optional_label: false,
            accepts_completion: true,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.optional_slot = true;
        self
    }

    pub const fn toggleable(mut self) -> Self {
        self.optional_label = true;
        self
    }

    pub const fn no_completion(mut self) -> Self {
        self.accepts_completion = false;
        self
    }
}

/// Immutable schema for one frame type.
#[derive(Debug)]
pub struct FrameTypeDefinition {
    pub kind: FrameKind,
    pub labels: &'static [FrameLabel],
    pub allow_children: bool,
    pub allow_joint_children: bool,
    pub forbidden_children: &'static [FrameKind],
    pub is_joint: bool,
    /// Types that may directly follow this frame in a joint chain.
    pub joint_types: &'static [FrameKind],
    pub colour: &'static str,
    pub draggable_group: DraggableGroup,
    pub inner_joint_draggable_group: DraggableGroup,
}

impl FrameTypeDefinition {
    pub fn forbids(&self, kind: FrameKind) -> bool {
        self.forbidden_children.contains(&kind)
    }

    pub fn allows_joint(&self, kind: FrameKind) -> bool {
        self.joint_types.contains(&kind)
    }

    /// Indices (within `labels`) of the editable slots.
    pub fn editable_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.slot)
            .map(|(index, _)| index)
    }

    pub fn is_editable_slot(&self, slot: usize) -> bool {
        self.labels.get(slot).is_some_and(|label| label.slot)
    }

    /// The drag family accepted by this frame's body.
    ///
    /// Containers only exchange frames with bodies of the same family; every
    /// other body holds ordinary code.
    pub fn body_group(&self) -> DraggableGroup {
        if self.kind.is_container() {
            self.draggable_group
        } else {
            DraggableGroup::Code
        }
    }
}

/// Look up a definition by its type identifier.
pub fn lookup(identifier: &str) -> Option<&'static FrameTypeDefinition> {
    identifier.parse::<FrameKind>().ok().map(FrameKind::definition)
}
