//! Interactive console for parsing queries against a compiled grammar.
//!
//! Reads queries from stdin; lines prefixed with `.` are commands.
//! Non-interactive use: `parlance --query "repos I like"` exits
//! non-zero when the query fails to parse.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use parlance::session::{compile, ParseOutcome, Session};
use parlance::{demo, interchange, SearchOptions};

#[derive(Parser)]
#[command(
    name = "parlance",
    about = "Parse natural-language queries into ranked semantic trees"
)]
struct Args {
    /// Number of parse trees to return per query
    #[arg(short, long, default_value_t = 7)]
    k: usize,

    /// Load a compiled-grammar JSON file instead of the bundled demo
    /// grammar
    #[arg(long)]
    grammar: Option<PathBuf>,

    /// Parse one query and exit; non-zero exit status on failure
    #[arg(short, long)]
    query: Option<String>,

    /// Run the demo query battery and exit
    #[arg(long)]
    test: bool,
}

struct Console {
    session: Session,
    grammar_path: Option<PathBuf>,
    opts: SearchOptions,
    show_trees: bool,
    show_costs: bool,
    show_time: bool,
    history: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let session = build_session(args.grammar.as_deref())?;
    let mut console = Console {
        session,
        grammar_path: args.grammar.clone(),
        opts: SearchOptions {
            k: args.k,
            ..SearchOptions::default()
        },
        show_trees: true,
        show_costs: false,
        show_time: false,
        history: Vec::new(),
    };
    for diag in console.session.diagnostics() {
        eprintln!("{}: {}", diag.severity.as_str(), diag.message);
    }

    if args.test {
        console.run_battery();
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(query) = &args.query {
        let failed = console.run_query(query);
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(ExitCode::SUCCESS);
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if let Some(command) = input.strip_prefix('.') {
            if !console.run_command(command)? {
                return Ok(ExitCode::SUCCESS);
            }
        } else {
            console.run_query(input);
        }
    }
}

fn build_session(path: Option<&std::path::Path>) -> Result<Session, Box<dyn std::error::Error>> {
    let grammar = match path {
        Some(path) => interchange::load(path)?,
        None => demo::grammar()?,
    };
    Ok(compile(grammar)?)
}

impl Console {
    /// Returns true when the query failed to produce trees.
    fn run_query(&mut self, query: &str) -> bool {
        self.history.push(query.to_string());
        let started = Instant::now();
        let outcome = self.session.parse(query, &self.opts);
        let elapsed = started.elapsed();
        if self.show_time {
            println!("({elapsed:.2?})");
        }
        match &outcome {
            ParseOutcome::Unparsable => {
                eprintln!("parse failed: no parse spans the input");
                true
            }
            ParseOutcome::NoLegalTrees => {
                eprintln!("parse failed: no semantically legal trees");
                true
            }
            ParseOutcome::Trees(trees) => {
                if self.show_trees {
                    for tree in trees {
                        if self.show_costs {
                            println!("{:8.4}  {}", tree.cost, tree.text);
                        } else {
                            println!("{}", tree.text);
                        }
                        println!("          {}", tree.semantic_str);
                        for disambiguation in &tree.disambiguations {
                            println!("          (vs {disambiguation})");
                        }
                    }
                }
                false
            }
        }
    }

    fn run_battery(&mut self) {
        for query in demo::TEST_QUERIES {
            println!("# {query}");
            self.run_query(query);
        }
    }

    /// Returns false to exit the loop.
    fn run_command(&mut self, command: &str) -> Result<bool, Box<dyn std::error::Error>> {
        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or("") {
            "help" => {
                println!(".k N         set the number of trees per query");
                println!(".trees       toggle tree output");
                println!(".costs       toggle cost display");
                println!(".time        toggle timing display");
                println!(".query       print the last query");
                println!(".history     print all queries this session");
                println!(".rebuild     recompile the grammar");
                println!(".stateTable  print the state table");
                println!(".forest      print the last query's parse forest");
                println!(".out PATH    write the augmented grammar JSON");
                println!(".test        run the demo query battery");
                println!(".exit        quit");
            }
            "k" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(k) if k > 0 => {
                    self.opts.k = k;
                    println!("k = {k}");
                }
                _ => eprintln!("usage: .k N"),
            },
            "trees" => {
                self.show_trees = !self.show_trees;
                println!("trees: {}", self.show_trees);
            }
            "costs" => {
                self.show_costs = !self.show_costs;
                println!("costs: {}", self.show_costs);
            }
            "time" => {
                self.show_time = !self.show_time;
                println!("time: {}", self.show_time);
            }
            "query" => match self.history.last() {
                Some(query) => println!("{query}"),
                None => println!("(no queries yet)"),
            },
            "history" => {
                for query in &self.history {
                    println!("{query}");
                }
            }
            "rebuild" => {
                self.session = build_session(self.grammar_path.as_deref())?;
                println!(
                    "rebuilt: {} states",
                    self.session.table().states.len()
                );
            }
            "stateTable" => {
                print!("{}", self.session.table().render());
            }
            "forest" => match self.history.last() {
                Some(query) => match parlance::parse::parse(self.session.table(), query) {
                    Ok(parsed) => {
                        print!("{}", parsed.forest.render(&self.session.table().symbols));
                    }
                    Err(err) => eprintln!("{err}"),
                },
                None => println!("(no queries yet)"),
            },
            "out" => match parts.next() {
                Some(path) => {
                    interchange::save(self.session.grammar(), std::path::Path::new(path))?;
                    println!("wrote {path}");
                }
                None => eprintln!("usage: .out PATH"),
            },
            "test" => self.run_battery(),
            "exit" => return Ok(false),
            other => eprintln!("unknown command `.{other}`; try .help"),
        }
        Ok(true)
    }
}
