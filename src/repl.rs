// Line-oriented front end around a `Session`.

use std::io::{self, BufRead, Write};

use crate::oracle::Oracle;
use crate::session::{Session, Step};

pub const WELCOME: &str = r#"Starting a new game. Type "h" for help or "q" for quit."#;

pub const PROMPT: &str = "Enter a clue: ";

pub const GOODBYE: &str = "Goodbye!";

pub const HELP: &str = r#"
Enter the information you're given, one clue at a time. Each piece of
information from the puzzle may take more than one clue here.

Each person is a single letter. A group of letters counts the INNOCENT
people in it; prefix the group with ~ to count CRIMINALS instead.

Comparison clues use one of these operators:
    =  (or ==)   equals
    != (or <>)   does not equal
    >            is greater than
    <            is less than
    >=           is greater than or equal to
    <=           is less than or equal to

Examples:
    a = 1        A is innocent
    b = 0        B is a criminal
    cd = 1       C and D are opposites
    ef = 2       E and F are both innocent
    gh > 0       G and H can't both be criminals
    ~gh = 1      exactly one of G and H is a criminal
    ijk > lmn    more innocents among I, J and K than among L, M and N
    tuv >= w     if W is innocent, then at least one of T, U and V is

Pattern clues:
    abcd is connected     the innocents among A..D sit next to each other
    ~abcd is connected    the criminals among A..D sit next to each other
    abc is odd            an odd number of A, B and C are innocent
    ~abc is even          an even number of A, B and C are criminals

Type "f" to list everything deduced so far, or "q" to quit.
"#;

enum Command<'a> {
    Help,
    Facts,
    Quit,
    Blank,
    Clue(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "h" | "help" => Command::Help,
        "f" | "facts" => Command::Facts,
        "q" | "quit" => Command::Quit,
        "" => Command::Blank,
        _ => Command::Clue(trimmed),
    }
}

pub struct Repl<O: Oracle> {
    session: Session<O>,
    /// Print the welcome banner before the first prompt
    pub banner: bool,
    /// Print store size after each accepted clue
    pub show_stats: bool,
}

impl<O: Oracle> Repl<O> {
    pub fn new(session: Session<O>) -> Self {
        Repl {
            session,
            banner: true,
            show_stats: false,
        }
    }

    /// Run until quit, a terminal session condition, or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, output: &mut W) -> io::Result<()> {
        if self.banner {
            writeln!(output, "{}", WELCOME)?;
        }

        let mut line = String::new();
        while !self.session.is_finished() {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }

            match parse_command(&line) {
                Command::Help => writeln!(output, "{}", HELP)?,
                Command::Facts => {
                    let mut any = false;
                    for fact in self.session.known_facts() {
                        writeln!(output, "{}", fact)?;
                        any = true;
                    }
                    if !any {
                        writeln!(output, "Nothing is known yet.")?;
                    }
                }
                Command::Quit => {
                    writeln!(output, "{}", GOODBYE)?;
                    return Ok(());
                }
                Command::Blank => {}
                Command::Clue(text) => match self.session.process(text) {
                    Step::Accepted { facts, warning } => {
                        if let Some(warning) = warning {
                            writeln!(output, "{}", warning)?;
                        }
                        for fact in facts {
                            writeln!(output, "{}", fact)?;
                        }
                        if self.show_stats {
                            let stats = self.session.store().stats();
                            writeln!(
                                output,
                                "  [{} clues, {} people, {} variables, {} clauses]",
                                stats.clues, stats.people, stats.variables, stats.clauses
                            )?;
                        }
                    }
                    Step::Rejected(message) => writeln!(output, "{}", message)?,
                    Step::Finished(message) => writeln!(output, "{}", message)?,
                },
            }
        }

        Ok(())
    }
}
