//! Command-line interface (CLI) for boxed terms and the renderer.
//!
//! `inspect` reads terms in their tagged JSON form and prints each one's
//! display form, kind, canonical map key and text.  `demo` mounts a small
//! counter page into an in-memory document, feeds it clicks and prints
//! the patch issued for each one.

use boxed_terms::{Term, TermError, atom, map};
use boxed_terms_render::{
    Attribute, DocumentError, Expression, HostEvent, MemoryDocument, Module, Node,
    OperationDescriptor, Registry, RenderError, Runtime, VNode,
};
use clap::{Parser as ClapParser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::mem;
use thiserror::Error;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspects terms
    Inspect {
        /// Input file with JSON encoded terms
        #[arg(short, long)]
        terms: String,
    },
    /// Runs the counter demo
    Demo {
        /// Number of clicks
        #[arg(short, long, default_value_t = 3)]
        clicks: usize,
    },
    /// Prints sizes
    Sizes {},
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

fn inspect(term: &Term) {
    println!("{term}");
    println!("  kind: {}", term.kind_name());
    println!("  key:  {}", term.map_key());
    match term.to_text() {
        Ok(text) => println!("  text: {text:?}"),
        Err(e) => println!("  text: {e}"),
    }
}

fn counter_registry() -> Registry {
    Registry::new().with(
        "Counter",
        Module::new(|| {
            Node::element(
                "div",
                vec![Attribute::literal("class", "counter")],
                vec![
                    Node::element(
                        "span",
                        vec![],
                        vec![Node::text("count: "), Node::Expression(Expression::var("count"))],
                    ),
                    Node::element(
                        "button",
                        vec![
                            Attribute::literal("id", "increment"),
                            Attribute::literal("on_click", "increment"),
                        ],
                        vec![Node::text("+")],
                    ),
                ],
            )
        })
        .with_actions(),
    )
}

fn demo(clicks: usize) -> Result<(), CliError> {
    let document = MemoryDocument::new();
    let container = document.root();
    let mut runtime = Runtime::new(
        counter_registry(),
        document,
        container,
        Vec::<OperationDescriptor>::new(),
    );
    let stats = runtime.mount_page("Counter".into(), map! { atom!("count") => 0 })?;
    println!("mounted: {stats}");

    for _ in 0..clicks {
        let Some(button) = runtime.document().find_by_attribute("id", "increment") else {
            break;
        };
        runtime.dispatch_event(&mut HostEvent::click(button))?;
        let operations = mem::take(runtime.dispatcher_mut());
        for operation in operations {
            if operation.action != atom!("increment") {
                continue;
            }
            let count = operation.state.get(&atom!("count"))?.cloned();
            let next = match count.as_ref().map(Term::unpack_integer).transpose()? {
                Some(n) => Term::integer(n + 1),
                None => Term::integer(1),
            };
            let stats = runtime.update_state(operation.state.put(atom!("count"), next)?)?;
            println!("{} {}: {stats}", operation.event_name, operation.action);
        }
    }

    let html = runtime.document().inner_html(container)?;
    println!("{html}");
    Ok(())
}

fn main() -> Result<(), CliError> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Inspect { terms: terms_path } => {
            let input = BufReader::new(File::open(&terms_path)?);
            for term in serde_json::Deserializer::from_reader(input).into_iter::<Term>() {
                inspect(&term?);
            }
        }
        Commands::Demo { clicks } => demo(clicks)?,
        Commands::Sizes {} => {
            println!("Size of Term: {}", mem::size_of::<Term>());
            println!("Size of Option<Term>: {}", mem::size_of::<Option<Term>>());
            println!("Size of VNode: {}", mem::size_of::<VNode>());
            println!("Size of Node: {}", mem::size_of::<Node>());
            println!(
                "Size of smartstring String: {}",
                mem::size_of::<smartstring::alias::String>()
            );
            println!(
                "Size of std::string::String: {}",
                mem::size_of::<std::string::String>()
            );
        }
    }

    Ok(())
}
