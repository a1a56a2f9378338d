//! Left-to-right token cursor that classifies spans against the keyword
//! vocabulary and, when available, the table's column catalog.

use crate::keyword::{Connector, Keyword, OperationKind};
use crate::plan::{ColumnRef, Literal};
use callframe_common::{ColumnCatalog, Error, Result};

/// Parse context. Decides which keywords terminate a run of free tokens.
///
/// Keywords that carry no meaning in a context are allowed inside a free
/// run, so `rename_total_to_total_count` keeps `count` in the new name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Column or value inside a filter condition.
    FilterTerm,
    SortColumn,
    GroupKey,
    AggColumn,
    /// Column in a `select` or `drop` list.
    ListColumn,
    RenameOld,
    RenameNew,
    JoinTarget,
    JoinKey,
}

impl Context {
    fn stops_at(self, keyword: Keyword) -> bool {
        use Connector::*;
        match (self, keyword) {
            (_, Keyword::Connector(And)) => true,
            (Context::FilterTerm, Keyword::Operator(_)) => true,
            (Context::FilterTerm, Keyword::Connector(Or)) => true,
            (Context::SortColumn, Keyword::Direction(_)) => true,
            (Context::GroupKey, Keyword::Operation(OperationKind::Aggregate)) => true,
            (Context::AggColumn, Keyword::Agg(_)) => true,
            (Context::AggColumn, Keyword::Operation(OperationKind::Aggregate)) => true,
            (Context::RenameOld, Keyword::Connector(To | As)) => true,
            (Context::JoinTarget, Keyword::Connector(On)) => true,
            _ => false,
        }
    }
}

pub struct Matcher<'a> {
    name: &'a str,
    tokens: &'a [String],
    pos: usize,
    catalog: Option<&'a ColumnCatalog>,
}

impl<'a> Matcher<'a> {
    pub fn new(name: &'a str, tokens: &'a [String], catalog: Option<&'a ColumnCatalog>) -> Self {
        Self { name, tokens, pos: 0, catalog }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    pub fn peek_keyword(&self) -> Option<Keyword> {
        self.keyword_at(self.pos)
    }

    pub fn keyword_at(&self, pos: usize) -> Option<Keyword> {
        self.tokens.get(pos).and_then(|t| Keyword::classify(t))
    }

    pub fn advance(&mut self) {
        if !self.is_done() {
            self.pos += 1;
        }
    }

    /// Raw tokens in `[start, end)`.
    pub fn span(&self, start: usize, end: usize) -> &'a [String] {
        let tokens: &'a [String] = self.tokens;
        &tokens[start..end.min(tokens.len())]
    }

    /// Consumes `connector` if it is the next token.
    pub fn eat_connector(&mut self, connector: Connector) -> bool {
        self.eat_keyword(Keyword::Connector(connector))
    }

    pub fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword() == Some(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Number of tokens starting at `pos` whose join is the longest known
    /// column, if any.
    pub fn schema_match_at(&self, pos: usize) -> Option<(usize, &'a str)> {
        let catalog = self.catalog?;
        let available = self.tokens.len().saturating_sub(pos);
        (1..=available).rev().find_map(|len| {
            let candidate = self.tokens[pos..pos + len].join("_");
            catalog.resolve(&candidate).map(|canonical| (len, canonical))
        })
    }

    /// Length of the run of free tokens starting at `pos` in `ctx`.
    pub fn run_len_at(&self, pos: usize, ctx: Context) -> usize {
        self.tokens
            .iter()
            .skip(pos)
            .take_while(|t| Keyword::classify(t).map_or(true, |kw| !ctx.stops_at(kw)))
            .count()
    }

    pub fn run_len(&self, ctx: Context) -> usize {
        self.run_len_at(self.pos, ctx)
    }

    /// Consumes a column reference.
    ///
    /// The longest schema-known column wins, even across keyword tokens;
    /// otherwise the maximal free run is taken and left unresolved for the
    /// dispatcher to validate.
    pub fn take_column(&mut self, ctx: Context) -> Result<ColumnRef> {
        if let Some((len, canonical)) = self.schema_match_at(self.pos) {
            self.pos += len;
            return Ok(ColumnRef::resolved(canonical));
        }
        let tokens = self.take_run(ctx);
        if tokens.is_empty() {
            let reason = match self.peek() {
                Some(token) => format!("expected a column name, found keyword '{}'", token),
                None => "expected a column name".to_string(),
            };
            return Err(Error::malformed(self.name, reason));
        }
        Ok(ColumnRef::unresolved(tokens.join("_")))
    }

    /// Consumes a literal value.
    ///
    /// A value position occupied by a keyword is rejected instead of read
    /// as text: the grammar has no quoting to tell the two apart.
    pub fn take_value(&mut self, ctx: Context, what: &str) -> Result<Literal> {
        let tokens = self.take_run(ctx);
        if tokens.is_empty() {
            return Err(self.missing_operand(what));
        }
        Ok(Literal::coerce(tokens.join("_")))
    }

    /// Consumes a free name (rename target, join target).
    pub fn take_name(&mut self, ctx: Context, what: &str) -> Result<String> {
        let tokens = self.take_run(ctx);
        if tokens.is_empty() {
            return Err(Error::malformed(self.name, format!("missing {}", what)));
        }
        Ok(tokens.join("_"))
    }

    pub fn take_run(&mut self, ctx: Context) -> &'a [String] {
        let len = self.run_len(ctx);
        let tokens: &'a [String] = self.tokens;
        let run = &tokens[self.pos..self.pos + len];
        self.pos += len;
        run
    }

    pub fn missing_operand(&self, what: &str) -> Error {
        match self.peek() {
            Some(token) => Error::ReservedWordLiteral { keyword: token.to_string() },
            None => Error::malformed(self.name, format!("missing {}", what)),
        }
    }

    /// Fails if any token was left unconsumed.
    pub fn finish(&self, operation: OperationKind) -> Result<()> {
        if self.is_done() {
            return Ok(());
        }
        let rest = self.tokens[self.pos..].join("_");
        Err(Error::unrecognized(
            self.name,
            format!("unexpected '{}' in {} call", rest, operation.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn free_run_stops_at_context_keywords() {
        let tokens = tokenize("city_equals_new_york_and_age_gt_3").unwrap();
        let mut m = Matcher::new("x", &tokens, None);
        assert_eq!(m.take_column(Context::FilterTerm).unwrap(), ColumnRef::unresolved("city"));
        m.advance();
        let value = m.take_value(Context::FilterTerm, "value").unwrap();
        assert_eq!(value.raw, "new_york");
        assert_eq!(m.peek(), Some("and"));
    }

    #[test]
    fn longest_schema_column_wins() {
        let catalog = ColumnCatalog::new(["new", "new_york", "first_name"]);
        let tokens = tokenize("new_york_first_name").unwrap();
        let mut m = Matcher::new("x", &tokens, Some(&catalog));
        assert_eq!(m.take_column(Context::ListColumn).unwrap(), ColumnRef::resolved("new_york"));
        // `first` is an aggregation keyword, but the schema knows `first_name`.
        assert_eq!(m.take_column(Context::ListColumn).unwrap(), ColumnRef::resolved("first_name"));
        assert!(m.is_done());
    }

    #[test]
    fn keywords_meaningless_in_context_stay_in_the_run() {
        let tokens = tokenize("total_count_and_x").unwrap();
        let mut m = Matcher::new("x", &tokens, None);
        assert_eq!(m.take_name(Context::RenameNew, "name").unwrap(), "total_count");
    }

    #[test]
    fn value_position_holding_a_keyword_is_rejected() {
        let tokens = tokenize("and_x").unwrap();
        let mut m = Matcher::new("x", &tokens, None);
        let err = m.take_value(Context::FilterTerm, "value").unwrap_err();
        assert!(matches!(err, Error::ReservedWordLiteral { ref keyword } if keyword == "and"));
    }

    #[test]
    fn finish_reports_leftovers() {
        let tokens = tokenize("a_b").unwrap();
        let mut m = Matcher::new("select_a_b", &tokens, None);
        m.advance();
        assert!(matches!(
            m.finish(OperationKind::Select),
            Err(Error::UnrecognizedOperation { .. })
        ));
    }
}
