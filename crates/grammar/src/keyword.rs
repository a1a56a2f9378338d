//! Reserved vocabulary of the call-name grammar.

use std::fmt;

/// Leading keyword of a call name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Filter,
    Sort,
    GroupBy,
    Aggregate,
    Select,
    Rename,
    Drop,
    Join(JoinKind),
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

/// Comparison operators usable inside a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Contains,
    StartsWith,
    EndsWith,
    IsIn,
    NotIn,
    Between,
    IsNull,
    NotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connector {
    And,
    Or,
    By,
    To,
    On,
    As,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Sum,
    Mean,
    Count,
    Min,
    Max,
    Std,
    Var,
    Median,
    NUnique,
    First,
    Last,
}

/// Classification of a single raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Operation(OperationKind),
    Operator(Operator),
    Connector(Connector),
    Direction(Direction),
    Agg(AggFunc),
}

impl Keyword {
    pub fn classify(token: &str) -> Option<Keyword> {
        if let Some(op) = OperationKind::from_token(token) {
            return Some(Keyword::Operation(op));
        }
        if let Some(op) = Operator::from_token(token) {
            return Some(Keyword::Operator(op));
        }
        if let Some(c) = Connector::from_token(token) {
            return Some(Keyword::Connector(c));
        }
        if let Some(d) = Direction::from_token(token) {
            return Some(Keyword::Direction(d));
        }
        AggFunc::from_token(token).map(Keyword::Agg)
    }
}

impl OperationKind {
    pub fn from_token(token: &str) -> Option<Self> {
        let kind = match token {
            "filter" => OperationKind::Filter,
            "sort" | "sortby" => OperationKind::Sort,
            "groupby" => OperationKind::GroupBy,
            "aggregate" => OperationKind::Aggregate,
            "select" => OperationKind::Select,
            "rename" => OperationKind::Rename,
            "drop" => OperationKind::Drop,
            "join" | "innerjoin" => OperationKind::Join(JoinKind::Inner),
            "leftjoin" => OperationKind::Join(JoinKind::Left),
            "rightjoin" => OperationKind::Join(JoinKind::Right),
            "outerjoin" => OperationKind::Join(JoinKind::Outer),
            "append" | "appendto" => OperationKind::Append,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Filter => "filter",
            OperationKind::Sort => "sort",
            OperationKind::GroupBy => "groupby",
            OperationKind::Aggregate => "aggregate",
            OperationKind::Select => "select",
            OperationKind::Rename => "rename",
            OperationKind::Drop => "drop",
            OperationKind::Join(JoinKind::Inner) => "join",
            OperationKind::Join(JoinKind::Left) => "leftjoin",
            OperationKind::Join(JoinKind::Right) => "rightjoin",
            OperationKind::Join(JoinKind::Outer) => "outerjoin",
            OperationKind::Append => "appendto",
        }
    }
}

impl Operator {
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "equals" | "eq" => Operator::Eq,
            "notequals" | "ne" => Operator::NotEq,
            "greaterthan" | "gt" => Operator::Gt,
            "lessthan" | "lt" => Operator::Lt,
            "greaterthanorequal" | "gte" => Operator::GtEq,
            "lessthanorequal" | "lte" => Operator::LtEq,
            "contains" => Operator::Contains,
            "startswith" => Operator::StartsWith,
            "endswith" => Operator::EndsWith,
            "isin" => Operator::IsIn,
            "notin" => Operator::NotIn,
            "between" => Operator::Between,
            "isna" | "isnull" => Operator::IsNull,
            "notna" | "notnull" => Operator::NotNull,
            _ => return None,
        };
        Some(op)
    }

    /// Operators that take no literal operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::NotNull)
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, Operator::Gt | Operator::Lt | Operator::GtEq | Operator::LtEq | Operator::Between)
    }

    pub fn is_text_match(&self) -> bool {
        matches!(self, Operator::Contains | Operator::StartsWith | Operator::EndsWith)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "equals",
            Operator::NotEq => "notequals",
            Operator::Gt => "greaterthan",
            Operator::Lt => "lessthan",
            Operator::GtEq => "greaterthanorequal",
            Operator::LtEq => "lessthanorequal",
            Operator::Contains => "contains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::IsIn => "isin",
            Operator::NotIn => "notin",
            Operator::Between => "between",
            Operator::IsNull => "isna",
            Operator::NotNull => "notna",
        }
    }
}

impl Connector {
    pub fn from_token(token: &str) -> Option<Self> {
        let connector = match token {
            "and" => Connector::And,
            "or" => Connector::Or,
            "by" => Connector::By,
            "to" => Connector::To,
            "on" => Connector::On,
            "as" => Connector::As,
            _ => return None,
        };
        Some(connector)
    }
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "asc" | "ascending" => Some(Direction::Asc),
            "desc" | "descending" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn is_ascending(&self) -> bool {
        matches!(self, Direction::Asc)
    }
}

impl AggFunc {
    pub fn from_token(token: &str) -> Option<Self> {
        let func = match token {
            "sum" => AggFunc::Sum,
            "mean" | "avg" | "average" => AggFunc::Mean,
            "count" => AggFunc::Count,
            "min" => AggFunc::Min,
            "max" => AggFunc::Max,
            "std" => AggFunc::Std,
            "var" => AggFunc::Var,
            "median" => AggFunc::Median,
            "nunique" => AggFunc::NUnique,
            "first" => AggFunc::First,
            "last" => AggFunc::Last,
            _ => return None,
        };
        Some(func)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Count => "count",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Std => "std",
            AggFunc::Var => "var",
            AggFunc::Median => "median",
            AggFunc::NUnique => "nunique",
            AggFunc::First => "first",
            AggFunc::Last => "last",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
