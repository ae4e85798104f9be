//! The static frame schema.
//!
//! Definitions are layered: [`DEFAULT`] is refined into the [`BLOCK`] and
//! [`STATEMENT`] bases, and every concrete type specialises one of those with
//! struct-update syntax.

use super::{DraggableGroup, FrameKind, FrameLabel, FrameTypeDefinition};

use FrameKind::*;

const BLOCK_FORBIDDEN: &[FrameKind] = &[
    Root,
    ImportsContainer,
    FuncDefsContainer,
    MainContainer,
    Import,
    FuncDef,
    Elif,
    Else,
    Except,
    Finally,
];

// Root holds only the three containers built by `FrameTree::new`.
const ROOT_FORBIDDEN: &[FrameKind] = &[
    Root, ImportsContainer, FuncDefsContainer, MainContainer, FuncDef, If, Elif, Else, For, While, Try, Except, Finally, With, Import, Break,
    Continue, Raise, Return, VarAssign, Comment, Empty,
];

// Everything but `import` and `comment`.
const IMPORTS_FORBIDDEN: &[FrameKind] = &[
    Root,
    ImportsContainer,
    FuncDefsContainer,
    MainContainer,
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
    Break,
    Continue,
    Raise,
    Return,
    VarAssign,
    Empty,
];

// Everything but `funcdef` and `comment`.
const FUNC_DEFS_FORBIDDEN: &[FrameKind] = &[
    Root,
    ImportsContainer,
    FuncDefsContainer,
    MainContainer,
    If,
    Elif,
    Else,
    For,
    While,
    Try,
    Except,
    Finally,
    With,
    Import,
    Break,
    Continue,
    Raise,
    Return,
    VarAssign,
    Empty,
];

pub const DEFAULT: FrameTypeDefinition = FrameTypeDefinition {
    kind: Empty,
    labels: &[],
    allow_children: false,
    allow_joint_children: false,
    forbidden_children: &[],
    is_joint: false,
    joint_types: &[],
    colour: "",
    draggable_group: DraggableGroup::None,
    inner_joint_draggable_group: DraggableGroup::None,
};

pub const BLOCK: FrameTypeDefinition = FrameTypeDefinition {
    allow_children: true,
    forbidden_children: BLOCK_FORBIDDEN,
    draggable_group: DraggableGroup::Code,
    ..DEFAULT
};

pub const STATEMENT: FrameTypeDefinition = FrameTypeDefinition {
    forbidden_children: FrameKind::ALL,
    draggable_group: DraggableGroup::Code,
    ..DEFAULT
};

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

pub static ROOT: FrameTypeDefinition = FrameTypeDefinition {
    kind: Root,
    forbidden_children: ROOT_FORBIDDEN,
    draggable_group: DraggableGroup::None,
    ..BLOCK
};

pub static IMPORTS_CONTAINER: FrameTypeDefinition = FrameTypeDefinition {
    kind: ImportsContainer,
    labels: &[FrameLabel::text("Imports:")],
    forbidden_children: IMPORTS_FORBIDDEN,
    colour: "#BBC6B6",
    draggable_group: DraggableGroup::Imports,
    ..BLOCK
};

pub static FUNC_DEFS_CONTAINER: FrameTypeDefinition = FrameTypeDefinition {
    kind: FuncDefsContainer,
    labels: &[FrameLabel::text("Function definitions:")],
    forbidden_children: FUNC_DEFS_FORBIDDEN,
    colour: "#BBC6B6",
    draggable_group: DraggableGroup::FunctionSignatures,
    ..BLOCK
};

pub static MAIN_CONTAINER: FrameTypeDefinition = FrameTypeDefinition {
    kind: MainContainer,
    labels: &[FrameLabel::text("My code:")],
    colour: "#BBC6B6",
    ..BLOCK
};

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

pub static FUNC_DEF: FrameTypeDefinition = FrameTypeDefinition {
    kind: FuncDef,
    labels: &[
        FrameLabel::slot("def ", "name").no_completion(),
        FrameLabel::slot("(", "parameters").optional().no_completion(),
        FrameLabel::text(") :"),
    ],
    colour: "#ECECC8",
    draggable_group: DraggableGroup::FunctionSignatures,
    ..BLOCK
};

pub static IF: FrameTypeDefinition = FrameTypeDefinition {
    kind: If,
    labels: &[FrameLabel::slot("if (", "condition"), FrameLabel::text(") :")],
    allow_joint_children: true,
    joint_types: &[Elif, Else],
    colour: "#E0DFE4",
    inner_joint_draggable_group: DraggableGroup::IfCompound,
    ..BLOCK
};

pub static ELIF: FrameTypeDefinition = FrameTypeDefinition {
    kind: Elif,
    labels: &[FrameLabel::slot("elif (", "condition"), FrameLabel::text(") :")],
    is_joint: true,
    joint_types: &[Elif, Else],
    draggable_group: DraggableGroup::IfCompound,
    ..BLOCK
};

pub static ELSE: FrameTypeDefinition = FrameTypeDefinition {
    kind: Else,
    labels: &[FrameLabel::text("else :")],
    is_joint: true,
    joint_types: &[Finally],
    draggable_group: DraggableGroup::IfCompound,
    ..BLOCK
};

pub static FOR: FrameTypeDefinition = FrameTypeDefinition {
    kind: For,
    labels: &[
        FrameLabel::slot("for ", "identifier").no_completion(),
        FrameLabel::slot(" in ", "list"),
        FrameLabel::text(" :"),
    ],
    allow_joint_children: true,
    joint_types: &[Else],
    colour: "#E4D6CE",
    ..BLOCK
};

pub static WHILE: FrameTypeDefinition = FrameTypeDefinition {
    kind: While,
    labels: &[FrameLabel::slot("while (", "condition"), FrameLabel::text(") :")],
    colour: "#E4D5D5",
    ..BLOCK
};

pub static TRY: FrameTypeDefinition = FrameTypeDefinition {
    kind: Try,
    labels: &[FrameLabel::text("try :")],
    allow_joint_children: true,
    joint_types: &[Except, Else, Finally],
    colour: "#C7D9DC",
    inner_joint_draggable_group: DraggableGroup::TryCompound,
    ..BLOCK
};

pub static EXCEPT: FrameTypeDefinition = FrameTypeDefinition {
    kind: Except,
    labels: &[
        FrameLabel::slot("except ", "exception").optional(),
        FrameLabel::text(" :"),
    ],
    is_joint: true,
    joint_types: &[Except, Else, Finally],
    draggable_group: DraggableGroup::TryCompound,
    ..BLOCK
};

pub static FINALLY: FrameTypeDefinition = FrameTypeDefinition {
    kind: Finally,
    labels: &[FrameLabel::text("finally :")],
    is_joint: true,
    draggable_group: DraggableGroup::None,
    ..BLOCK
};

pub static WITH: FrameTypeDefinition = FrameTypeDefinition {
    kind: With,
    labels: &[
        FrameLabel::slot("with ", "expression"),
        FrameLabel::slot(" as ", "identifier"),
        FrameLabel::text(" :"),
    ],
    colour: "#ede8f2",
    ..BLOCK
};

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

pub static IMPORT: FrameTypeDefinition = FrameTypeDefinition {
    kind: Import,
    labels: &[
        FrameLabel::slot("from ", "module").toggleable(),
        FrameLabel::slot("import ", "function/class"),
        FrameLabel::slot("as ", "module").toggleable(),
    ],
    colour: "#CBD4C8",
    draggable_group: DraggableGroup::Imports,
    ..STATEMENT
};

pub static BREAK: FrameTypeDefinition = FrameTypeDefinition {
    kind: Break,
    labels: &[FrameLabel::text("break")],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub static CONTINUE: FrameTypeDefinition = FrameTypeDefinition {
    kind: Continue,
    labels: &[FrameLabel::text("continue")],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub static RAISE: FrameTypeDefinition = FrameTypeDefinition {
    kind: Raise,
    labels: &[FrameLabel::slot("raise ", "exception").optional()],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub static RETURN: FrameTypeDefinition = FrameTypeDefinition {
    kind: Return,
    labels: &[FrameLabel::slot("return ", "expression").optional()],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub static VAR_ASSIGN: FrameTypeDefinition = FrameTypeDefinition {
    kind: VarAssign,
    labels: &[
        FrameLabel::slot("", "identifier").no_completion(),
        FrameLabel::slot(" = ", "value"),
    ],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub static COMMENT: FrameTypeDefinition = FrameTypeDefinition {
    kind: Comment,
    labels: &[FrameLabel::slot("# ", "your comment").optional().no_completion()],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub static EMPTY: FrameTypeDefinition = FrameTypeDefinition {
    kind: Empty,
    labels: &[FrameLabel::slot("", "function call").optional()],
    colour: "#F6F2E9",
    ..STATEMENT
};

pub(crate) fn definition_for(kind: FrameKind) -> &'static FrameTypeDefinition {
    match kind {
        Root => &ROOT,
        ImportsContainer => &IMPORTS_CONTAINER,
        FuncDefsContainer => &FUNC_DEFS_CONTAINER,
        MainContainer => &MAIN_CONTAINER,
        FuncDef => &FUNC_DEF,
        If => &IF,
        Elif => &ELIF,
        Else => &ELSE,
        For => &FOR,
        While => &WHILE,
        Try => &TRY,
        Except => &EXCEPT,
        Finally => &FINALLY,
        With => &WITH,
        Import => &IMPORT,
        Break => &BREAK,
        Continue => &CONTINUE,
        Raise => &RAISE,
        Return => &RETURN,
        VarAssign => &VAR_ASSIGN,
        Comment => &COMMENT,
        Empty => &EMPTY,
    }
}
