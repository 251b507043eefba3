//! Movie Lister Demo - a small application wired by ferrous-ioc
//!
//! This example demonstrates:
//! - Capability autowiring with a primary implementation
//! - Qualified and optional dependencies
//! - Collection injection of every message sender
//! - External values with `${key:default}` placeholders
//! - Init and destroy hooks, and an orderly shutdown

use ferrous_ioc::*;
use std::sync::Arc;

trait MovieFinder: Send + Sync {
    fn find_all(&self) -> Vec<(String, String)>;
}

struct ColonDelimitedMovieFinder {
    file: String,
    movies: Vec<(String, String)>,
}

impl Initialize for ColonDelimitedMovieFinder {
    fn after_properties_set(&mut self) -> Result<(), BoxError> {
        println!("Loading movies from {}", self.file);
        self.movies = "Alien:Ridley Scott\nBlade Runner:Ridley Scott\nHeat:Michael Mann"
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(title, director)| (title.to_string(), director.to_string()))
            .collect();
        Ok(())
    }
}

impl MovieFinder for ColonDelimitedMovieFinder {
    fn find_all(&self) -> Vec<(String, String)> {
        self.movies.clone()
    }
}

struct InMemoryMovieFinder;

impl MovieFinder for InMemoryMovieFinder {
    fn find_all(&self) -> Vec<(String, String)> {
        vec![("Solaris".to_string(), "Andrei Tarkovsky".to_string())]
    }
}

struct MovieLister {
    finder: Arc<dyn MovieFinder>,
}

impl MovieLister {
    fn movies_directed_by(&self, director: &str) -> Vec<String> {
        self.finder
            .find_all()
            .into_iter()
            .filter(|(_, d)| d == director)
            .map(|(title, _)| title)
            .collect()
    }
}

trait MessageSender: Send + Sync {
    fn send(&self, text: &str);
}

struct ConsoleSender {
    prefix: String,
}

impl MessageSender for ConsoleSender {
    fn send(&self, text: &str) {
        println!("[{}] {}", self.prefix, text);
    }
}

struct Notifier {
    senders: Vec<(String, Arc<dyn MessageSender>)>,
    lister: Arc<MovieLister>,
}

impl Notifier {
    fn announce(&self, director: &str) {
        let titles = self.lister.movies_directed_by(director).join(", ");
        for (name, sender) in &self.senders {
            sender.send(&format!("via {}: {} directed {}", name, director, titles));
        }
    }
}

fn console_sender(name: &str, default_prefix: &str) -> Definition {
    let placeholder = format!("${{senders.{}.prefix:{}}}", name, default_prefix);
    Definition::factory(name.to_string(), || Ok(ConsoleSender { prefix: String::new() }))
        .capability("MessageSender")
        .property("prefix", PropertyValue::placeholder(&placeholder), |s, v| {
            s.prefix = v.into_text()?;
            Ok(())
        })
        .view::<dyn MessageSender>(|s| s as Arc<dyn MessageSender>)
        .build()
}

fn main() -> Result<(), DiError> {
    println!("=== Movie Lister Demo ===\n");

    let mut builder = ContainerBuilder::new();
    builder
        .value_source(
            ChainedValueSource::new()
                .then(EnvValueSource::with_prefix("MOVIES"))
                .then(MapValueSource::new().with("finder.file", "movies1.txt")),
        )
        .options(ContainerOptions::default().eager_singletons(true).validate_on_build(true))
        .add_observer(Arc::new(TracingObserver::new()));

    builder.register(
        Definition::factory("colonFinder", || {
            Ok(ColonDelimitedMovieFinder {
                file: String::new(),
                movies: Vec::new(),
            })
        })
        .capability("MovieFinder")
        .primary()
        .property("file", PropertyValue::placeholder("${finder.file}"), |f, v| {
            f.file = v.into_text()?;
            Ok(())
        })
        .initializing()
        .destroy(|f| {
            println!("Closing {}", f.file);
            Ok(())
        })
        .view::<dyn MovieFinder>(|f| f as Arc<dyn MovieFinder>)
        .build(),
    )?;
    builder.register(
        Definition::factory("memoryFinder", || Ok(InMemoryMovieFinder))
            .capability("MovieFinder")
            .view::<dyn MovieFinder>(|f| f as Arc<dyn MovieFinder>)
            .build(),
    )?;
    builder.register(
        Definition::constructor("movieLister", [DependencyRequest::single("MovieFinder")], |args| {
            Ok(MovieLister {
                finder: args.view::<dyn MovieFinder>(0)?,
            })
        })
        .capability("MovieLister")
        .alias("lister")
        .build(),
    )?;
    builder.register(
        Definition::constructor(
            "archiveLister",
            [DependencyRequest::single("MovieFinder").qualified("memoryFinder")],
            |args| {
                Ok(MovieLister {
                    finder: args.view::<dyn MovieFinder>(0)?,
                })
            },
        )
        .transient()
        .build(),
    )?;
    builder.register_all([console_sender("console", "console"), console_sender("audit", "audit")])?;
    builder.register(
        Definition::constructor(
            "notifier",
            [
                DependencyRequest::collection("MessageSender"),
                DependencyRequest::single("MovieLister").qualified("lister"),
            ],
            |args| {
                Ok(Notifier {
                    senders: args.components(0)?.views::<dyn MessageSender>()?,
                    lister: args.arc::<MovieLister>(1)?,
                })
            },
        )
        .build(),
    )?;

    for descriptor in builder.descriptors() {
        println!(
            "registered {:<14} {:?} primary={} deps={}",
            descriptor.name,
            descriptor.scope,
            descriptor.primary,
            descriptor.dependencies.len()
        );
    }

    let container = builder.build()?;

    let lister = container.get_as::<MovieLister>("lister")?;
    println!("\nRidley Scott: {:?}", lister.movies_directed_by("Ridley Scott"));

    let archive = container.get_as::<MovieLister>("archiveLister")?;
    println!("Tarkovsky (archive): {:?}", archive.movies_directed_by("Andrei Tarkovsky"));

    match container.get_by_capability("MovieFinder", None) {
        Ok(finder) => println!("Primary finder: {}", finder.name()),
        Err(err) => println!("Lookup failed: {}", err),
    }

    println!();
    container.get_as::<Notifier>("notifier")?.announce("Michael Mann");

    println!("\nShutting down");
    container.shutdown()?;
    Ok(())
}
