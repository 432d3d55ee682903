//! Numbered-menu console binding.

use std::io::{self, BufRead, Stdout, StdinLock, Write};

use crate::schema::{split_size, Concentration, SizeUnit};

use super::resolver::{Answer, InteractiveContext, InteractiveResolver, DEFAULT_CONFIDENCE_THRESHOLD};

/// What the operator typed at a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Choice {
    Option(usize),
    Clear,
    Skip,
    Text(String),
}

/// Asks questions on a writer and reads answers from a reader.
///
/// At each menu: a number picks that option, `0` or `none` clears the field,
/// an empty line (or end of input) keeps the detected value. Size menus also
/// accept a typed size such as `50 ml`.
pub struct ConsoleResolver<R, W> {
    input: R,
    output: W,
    threshold: f64,
}

impl ConsoleResolver<StdinLock<'static>, Stdout> {
    /// Resolver on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Give back the writer, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Write a prompt and read one trimmed line. `None` on end of input.
    fn read_answer(&mut self, prompt: &str) -> Option<String> {
        write!(self.output, "{}", prompt).ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    /// Print the question and its numbered options.
    fn menu(&mut self, context: &InteractiveContext<'_>, question: &str, options: &[String]) -> io::Result<()> {
        writeln!(
            self.output,
            "\nRow {}: {}\n  text: {}\n  {} (confidence {:.2})",
            context.row_number, context.raw_row_text, context.original_text, question, context.confidence
        )?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, option)?;
        }
        writeln!(self.output, "  [0] none")
    }

    fn choose(
        &mut self,
        context: &InteractiveContext<'_>,
        question: &str,
        options: &[String],
        free_text: bool,
    ) -> Choice {
        // Unseen questions are skipped.
        if self.menu(context, question, options).is_err() {
            return Choice::Skip;
        }

        loop {
            let prompt = if free_text {
                "Choice, or type a value (Enter keeps detected): "
            } else {
                "Choice (Enter keeps detected): "
            };
            let Some(answer) = self.read_answer(prompt) else {
                return Choice::Skip;
            };

            if answer.is_empty() {
                return Choice::Skip;
            }
            if answer.eq_ignore_ascii_case("none") {
                return Choice::Clear;
            }
            match answer.parse::<usize>() {
                Ok(0) => return Choice::Clear,
                Ok(n) if n <= options.len() => return Choice::Option(n - 1),
                _ if free_text => return Choice::Text(answer),
                _ => {
                    if writeln!(self.output, "  Enter a number between 0 and {}", options.len()).is_err() {
                        return Choice::Skip;
                    }
                }
            }
        }
    }

    fn pick<T: Clone>(&mut self, context: &InteractiveContext<'_>, candidates: &[T], labels: Vec<String>) -> Answer<T> {
        let question = format!("Which {}?", context.attribute);
        match self.choose(context, &question, &labels, false) {
            Choice::Option(i) => Answer::Use(candidates[i].clone()),
            Choice::Clear => Answer::Clear,
            Choice::Skip | Choice::Text(_) => Answer::Skip,
        }
    }
}

impl<R: BufRead, W: Write> InteractiveResolver for ConsoleResolver<R, W> {
    fn resolve_brand(&mut self, context: &InteractiveContext<'_>, candidates: &[u32]) -> Answer<u32> {
        if candidates.is_empty() {
            return Answer::Skip;
        }
        let labels = candidates.iter().map(|id| format!("brand #{}", id)).collect();
        self.pick(context, candidates, labels)
    }

    fn resolve_concentration(
        &mut self,
        context: &InteractiveContext<'_>,
        candidates: &[Concentration],
    ) -> Answer<Concentration> {
        if candidates.is_empty() {
            return Answer::Skip;
        }
        let labels = candidates.iter().map(|c| c.to_string()).collect();
        self.pick(context, candidates, labels)
    }

    fn resolve_size(
        &mut self,
        context: &InteractiveContext<'_>,
        candidates: &[(String, SizeUnit)],
    ) -> Answer<(String, SizeUnit)> {
        let labels: Vec<String> = candidates
            .iter()
            .map(|(size, unit)| format!("{} {}", size, unit))
            .collect();

        loop {
            match self.choose(context, "Which size?", &labels, true) {
                Choice::Option(i) => return Answer::Use(candidates[i].clone()),
                Choice::Clear => return Answer::Clear,
                Choice::Skip => return Answer::Skip,
                Choice::Text(text) => match split_size(&text) {
                    Some((size, Some(unit))) => return Answer::Use((size, unit)),
                    _ => {
                        if writeln!(self.output, "  Could not read '{}' as a size like '50 ml'", text).is_err() {
                            return Answer::Skip;
                        }
                    }
                },
            }
        }
    }

    fn resolve_general(
        &mut self,
        context: &InteractiveContext<'_>,
        question: &str,
        options: &[String],
    ) -> Answer<usize> {
        if options.is_empty() {
            return Answer::Skip;
        }
        match self.choose(context, question, options, false) {
            Choice::Option(i) => Answer::Use(i),
            Choice::Clear => Answer::Clear,
            Choice::Skip | Choice::Text(_) => Answer::Skip,
        }
    }

    fn should_learn(
        &mut self,
        context: &InteractiveContext<'_>,
        original_text: &str,
        detected_summary: &str,
    ) -> bool {
        let shown = writeln!(
            self.output,
            "\nRow {}: {}\n  detected: {}",
            context.row_number, original_text, detected_summary
        );
        if shown.is_err() {
            return false;
        }
        self.read_answer("Teach a rule for this text? [y/N] ")
            .is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"))
    }

    fn teaching_statements(&mut self, _context: &InteractiveContext<'_>) -> Vec<String> {
        let shown = writeln!(
            self.output,
            "  One statement per line, e.g. 'POUR ELLE -> gender = female' or '(\\d+) CC -> size = ml'.\n  Empty line to finish."
        );
        if shown.is_err() {
            return Vec::new();
        }
        let mut statements = Vec::new();
        while let Some(line) = self.read_answer("> ") {
            if line.is_empty() {
                break;
            }
            statements.push(line);
        }
        statements
    }

    fn confidence_threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ProductRecord;
    use crate::schema::AttributeKind;
    use std::io::Cursor;

    fn context(record: &ProductRecord, attribute: AttributeKind) -> InteractiveContext<'_> {
        InteractiveContext {
            row_number: 2,
            attribute,
            field_name: "size",
            original_text: "ADP BLU 30ML EDT 29.6ML",
            record,
            confidence: 0.6,
            raw_row_text: "A1,ADP BLU 30ML EDT 29.6ML",
        }
    }

    fn console(input: &str) -> ConsoleResolver<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleResolver::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_numbered_choice() {
        let record = ProductRecord::default();
        let mut resolver = console("2\n");
        let candidates = vec![
            ("30".to_string(), SizeUnit::Ml),
            ("29.6".to_string(), SizeUnit::Ml),
        ];
        let answer = resolver.resolve_size(&context(&record, AttributeKind::Size), &candidates);
        assert_eq!(answer, Answer::Use(("29.6".to_string(), SizeUnit::Ml)));

        let printed = String::from_utf8(resolver.into_output()).unwrap();
        assert!(printed.contains("[1] 30 ml"));
        assert!(printed.contains("[2] 29.6 ml"));
    }

    #[test]
    fn test_manual_size_entry_after_bad_input() {
        let record = ProductRecord::default();
        let mut resolver = console("lots\n50 ml\n");
        let answer = resolver.resolve_size(&context(&record, AttributeKind::Size), &[]);
        assert_eq!(answer, Answer::Use(("50".to_string(), SizeUnit::Ml)));
    }

    #[test]
    fn test_none_clears_and_empty_skips() {
        let record = ProductRecord::default();
        let ctx = context(&record, AttributeKind::Concentration);

        let mut resolver = console("none\n\n");
        assert_eq!(resolver.resolve_concentration(&ctx, &[Concentration::Edp]), Answer::Clear);
        assert_eq!(resolver.resolve_concentration(&ctx, &[Concentration::Edp]), Answer::Skip);
        // End of input.
        assert_eq!(resolver.resolve_concentration(&ctx, &[Concentration::Edp]), Answer::Skip);
    }

    #[test]
    fn test_out_of_range_reprompts() {
        let record = ProductRecord::default();
        let ctx = context(&record, AttributeKind::Gender);
        let options = vec!["female".to_string(), "male".to_string()];

        let mut resolver = console("7\n2\n");
        assert_eq!(resolver.resolve_general(&ctx, "Which gender?", &options), Answer::Use(1));
    }

    #[test]
    fn test_teaching_dialogue() {
        let record = ProductRecord::default();
        let ctx = context(&record, AttributeKind::Size);

        let mut resolver = console("y\nPOUR ELLE -> gender = female\n(\\d+) CC -> size = ml\n\n");
        assert!(resolver.should_learn(&ctx, "ROSE POUR ELLE 50 CC", "nothing detected"));
        assert_eq!(
            resolver.teaching_statements(&ctx),
            vec!["POUR ELLE -> gender = female", "(\\d+) CC -> size = ml"]
        );
    }

    struct ClosedOutput;

    impl Write for ClosedOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_output_answers_skip() {
        let record = ProductRecord::default();
        let ctx = context(&record, AttributeKind::Size);
        let mut resolver = ConsoleResolver::new(Cursor::new(b"1\ny\nA -> gender = female\n".to_vec()), ClosedOutput);

        let candidates = vec![("30".to_string(), SizeUnit::Ml)];
        assert_eq!(resolver.resolve_size(&ctx, &candidates), Answer::Skip);
        assert_eq!(resolver.resolve_size(&ctx, &[]), Answer::Skip);
        assert!(!resolver.should_learn(&ctx, "ROSE", "nothing detected"));
        assert!(resolver.teaching_statements(&ctx).is_empty());
    }
}
