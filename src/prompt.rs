use std::io::{self, BufRead, Write};

/// Interactive prompter over any line-based reader/writer pair.
///
/// The installer collects every answer up front and only then runs the flow,
/// so this stays a thin question-and-answer layer with no install logic in
/// it. Generic over the streams so tests drive it with in-memory buffers.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter wired to the process stdin/stdout.
    pub fn stdio() -> Self {
        Prompter {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Consume the prompter and hand back the output stream, so a scripted
    /// session can be inspected afterwards.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Free-text question with a default shown in brackets.
    ///
    /// Empty input (or end of input) takes the default.
    pub fn ask_text(&mut self, question: &str, default: &str) -> io::Result<String> {
        write!(self.output, "{} [{}]: ", question, default)?;
        self.output.flush()?;

        let line = self.read_trimmed()?;
        match line {
            Some(answer) if !answer.is_empty() => Ok(answer),
            _ => Ok(default.to_string()),
        }
    }

    /// Numbered single-choice question; returns the chosen index.
    ///
    /// Accepts a 1-based number or the choice text (case-insensitive) and
    /// re-asks on anything else, with a nearest-match hint when the input
    /// looks like a misspelling. Empty input takes the default.
    pub fn ask_choice(
        &mut self,
        question: &str,
        choices: &[&str],
        default_index: usize,
    ) -> io::Result<usize> {
        writeln!(self.output, "{}:", question)?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, choice)?;
        }

        loop {
            write!(self.output, "Select [{}]: ", choices[default_index])?;
            self.output.flush()?;

            let line = match self.read_trimmed()? {
                Some(line) => line,
                // end of input: same as accepting the default
                None => return Ok(default_index),
            };

            if line.is_empty() {
                return Ok(default_index);
            }

            if let Ok(n) = line.parse::<usize>() {
                if (1..=choices.len()).contains(&n) {
                    return Ok(n - 1);
                }
            }

            if let Some(i) = choices
                .iter()
                .position(|c| c.eq_ignore_ascii_case(&line))
            {
                return Ok(i);
            }

            match nearest(&line, choices) {
                Some(suggestion) => writeln!(
                    self.output,
                    "Unrecognized choice '{}' (did you mean '{}'?)",
                    line, suggestion
                )?,
                None => writeln!(self.output, "Unrecognized choice '{}'", line)?,
            }
        }
    }

    /// Yes/no question. Empty input (or end of input) takes the default.
    pub fn ask_yes_no(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        loop {
            write!(self.output, "{} {}: ", question, hint)?;
            self.output.flush()?;

            let line = match self.read_trimmed()? {
                Some(line) => line.to_lowercase(),
                None => return Ok(default),
            };

            match line.as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => writeln!(self.output, "Please answer y or n (got '{}')", other)?,
            }
        }
    }

    /// Plain line on the answer stream, for diagnostics between questions.
    pub fn note(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    /// One trimmed line, or `None` at end of input.
    fn read_trimmed(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Closest choice to a mistyped input, if any is close enough to suggest.
pub fn nearest<'a>(input: &str, choices: &[&'a str]) -> Option<&'a str> {
    let lowered = input.to_lowercase();
    choices
        .iter()
        .map(|c| (*c, strsim::jaro_winkler(&lowered, &c.to_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(p: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.into_output()).unwrap()
    }

    #[test]
    fn test_ask_text_takes_typed_answer() {
        let mut p = prompter("my-shop\n");
        let answer = p.ask_text("Project name", "yui-laravel-project").unwrap();
        assert_eq!(answer, "my-shop");
    }

    #[test]
    fn test_ask_text_empty_takes_default() {
        let mut p = prompter("\n");
        let answer = p.ask_text("Project name", "yui-laravel-project").unwrap();
        assert_eq!(answer, "yui-laravel-project");
    }

    #[test]
    fn test_ask_text_eof_takes_default() {
        let mut p = prompter("");
        let answer = p.ask_text("Project name", "yui-laravel-project").unwrap();
        assert_eq!(answer, "yui-laravel-project");
    }

    #[test]
    fn test_ask_text_trims_whitespace() {
        let mut p = prompter("  my-shop  \n");
        let answer = p.ask_text("Project name", "x").unwrap();
        assert_eq!(answer, "my-shop");
    }

    #[test]
    fn test_ask_choice_by_number() {
        let mut p = prompter("2\n");
        let i = p.ask_choice("Database", &["sqlite", "mysql"], 0).unwrap();
        assert_eq!(i, 1);
    }

    #[test]
    fn test_ask_choice_by_literal_case_insensitive() {
        let mut p = prompter("MySQL\n");
        let i = p.ask_choice("Database", &["sqlite", "mysql"], 0).unwrap();
        assert_eq!(i, 1);
    }

    #[test]
    fn test_ask_choice_empty_takes_default() {
        let mut p = prompter("\n");
        let i = p.ask_choice("Database", &["sqlite", "mysql"], 0).unwrap();
        assert_eq!(i, 0);
    }

    #[test]
    fn test_ask_choice_reprompts_with_hint() {
        let mut p = prompter("myslq\n2\n");
        let i = p.ask_choice("Database", &["sqlite", "mysql"], 0).unwrap();
        assert_eq!(i, 1);
        let shown = output(p);
        assert!(shown.contains("did you mean 'mysql'?"), "output: {shown}");
    }

    #[test]
    fn test_ask_choice_out_of_range_number_reprompts() {
        let mut p = prompter("9\n1\n");
        let i = p.ask_choice("Database", &["sqlite", "mysql"], 0).unwrap();
        assert_eq!(i, 0);
    }

    #[test]
    fn test_ask_choice_lists_options() {
        let mut p = prompter("\n");
        let _ = p.ask_choice("Database", &["sqlite", "mysql"], 0).unwrap();
        let shown = output(p);
        assert!(shown.contains("[1] sqlite"));
        assert!(shown.contains("[2] mysql"));
    }

    #[test]
    fn test_ask_yes_no_variants() {
        for (input, default, want) in [
            ("y\n", false, true),
            ("YES\n", false, true),
            ("n\n", true, false),
            ("no\n", true, false),
            ("\n", true, true),
            ("\n", false, false),
            ("", false, false),
        ] {
            let mut p = prompter(input);
            assert_eq!(p.ask_yes_no("Install?", default).unwrap(), want);
        }
    }

    #[test]
    fn test_ask_yes_no_reprompts_on_garbage() {
        let mut p = prompter("maybe\ny\n");
        assert!(p.ask_yes_no("Install?", false).unwrap());
        assert!(output(p).contains("Please answer y or n"));
    }

    #[test]
    fn test_nearest_suggests_close_match() {
        assert_eq!(nearest("hero ui", &["Hero UI", "shadcn/ui"]), Some("Hero UI"));
        assert_eq!(nearest("zzz", &["Hero UI", "shadcn/ui"]), None);
    }
}
