// ragwatch-core/src/domain/rules/ast.rs

/// Names are matched case-insensitively and underscores are ignored,
/// so `JobStatus`, `job_status` and `jobstatus` resolve alike.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    Str(String),
    Runs,
    Reference,
    /// Lambda parameter, indexed by nesting depth.
    Param(usize),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Property(Box<Expr>, Property),
    Call(Box<Expr>, Method, Option<CallArg>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Lambda(Box<Expr>),
    Value(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunField {
    BusinessEntity,
    JobStart,
    JobEnd,
    JobStatus,
    QualityStatus,
    RecordAsOfDate,
    RecordLoaded,
    RecordFailed,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Field(RunField),
    Length,
    Date,
    Hour,
}

impl Property {
    pub fn resolve(name: &str) -> Option<Self> {
        let field = match normalize(name).as_str() {
            "businessentity" | "entity" => RunField::BusinessEntity,
            "jobstart" | "start" => RunField::JobStart,
            "jobend" | "end" => RunField::JobEnd,
            "jobstatus" | "status" => RunField::JobStatus,
            "qualitystatus" | "quality" => RunField::QualityStatus,
            "recordasofdate" | "asofdate" | "asof" => RunField::RecordAsOfDate,
            "recordloaded" | "loaded" => RunField::RecordLoaded,
            "recordfailed" | "failed" => RunField::RecordFailed,
            "message" => RunField::Message,
            "length" => return Some(Property::Length),
            "date" => return Some(Property::Date),
            "hour" => return Some(Property::Hour),
            _ => return None,
        };
        Some(Property::Field(field))
    }
}

/// What a method accepts between its parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    Nothing,
    OptionalLambda,
    Lambda,
    Value,
}

impl ArgShape {
    pub fn describe(self) -> &'static str {
        match self {
            ArgShape::Nothing => "no arguments",
            ArgShape::OptionalLambda => "zero arguments or one lambda",
            ArgShape::Lambda => "exactly one lambda",
            ArgShape::Value => "exactly one value argument",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Any,
    All,
    Count,
    First,
    Last,
    Where,
    Skip,
    Take,
    OrderBy,
    OrderByDescending,
    Sum,
    Max,
    Min,
    ToLower,
    ToUpper,
    Trim,
    EqualsIgnoreCase,
    Contains,
    StartsWith,
    EndsWith,
    AddHours,
    AddMinutes,
    AddDays,
}

impl Method {
    pub fn resolve(name: &str) -> Option<Self> {
        Some(match normalize(name).as_str() {
            "any" => Method::Any,
            "all" => Method::All,
            "count" => Method::Count,
            "first" => Method::First,
            "last" => Method::Last,
            "where" => Method::Where,
            "skip" => Method::Skip,
            "take" => Method::Take,
            "orderby" => Method::OrderBy,
            "orderbydescending" => Method::OrderByDescending,
            "sum" => Method::Sum,
            "max" => Method::Max,
            "min" => Method::Min,
            "tolower" => Method::ToLower,
            "toupper" => Method::ToUpper,
            "trim" => Method::Trim,
            "equalsignorecase" => Method::EqualsIgnoreCase,
            "contains" => Method::Contains,
            "startswith" => Method::StartsWith,
            "endswith" => Method::EndsWith,
            "addhours" => Method::AddHours,
            "addminutes" => Method::AddMinutes,
            "adddays" => Method::AddDays,
            _ => return None,
        })
    }

    pub fn shape(self) -> ArgShape {
        match self {
            Method::Any | Method::Count | Method::First | Method::Last => ArgShape::OptionalLambda,
            Method::All
            | Method::Where
            | Method::OrderBy
            | Method::OrderByDescending
            | Method::Sum
            | Method::Max
            | Method::Min => ArgShape::Lambda,
            Method::Skip
            | Method::Take
            | Method::EqualsIgnoreCase
            | Method::Contains
            | Method::StartsWith
            | Method::EndsWith
            | Method::AddHours
            | Method::AddMinutes
            | Method::AddDays => ArgShape::Value,
            Method::ToLower | Method::ToUpper | Method::Trim => ArgShape::Nothing,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Any => "any",
            Method::All => "all",
            Method::Count => "count",
            Method::First => "first",
            Method::Last => "last",
            Method::Where => "where",
            Method::Skip => "skip",
            Method::Take => "take",
            Method::OrderBy => "orderBy",
            Method::OrderByDescending => "orderByDescending",
            Method::Sum => "sum",
            Method::Max => "max",
            Method::Min => "min",
            Method::ToLower => "toLower",
            Method::ToUpper => "toUpper",
            Method::Trim => "trim",
            Method::EqualsIgnoreCase => "equalsIgnoreCase",
            Method::Contains => "contains",
            Method::StartsWith => "startsWith",
            Method::EndsWith => "endsWith",
            Method::AddHours => "addHours",
            Method::AddMinutes => "addMinutes",
            Method::AddDays => "addDays",
        }
    }
}
