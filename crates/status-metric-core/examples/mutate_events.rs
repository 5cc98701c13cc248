use status_metric_core::{Config, Event, Mutator};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// Reads one JSON event per line and prints the derived point per event:
/// `<name>\t<value>\t<tags>` or `<error>` when the event is rejected.
fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1);
    let reader: Box<dyn BufRead> = match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mutator = Mutator::field_path();
    let config = Config::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let event: Event = serde_json::from_str(&line)?;
        match mutator.mutate(event, &config) {
            Ok(mutated) => {
                let Some(point) = mutated.metrics.as_ref().and_then(|m| m.points.last()) else {
                    continue;
                };
                let tags: Vec<String> = point
                    .tags
                    .iter()
                    .map(|t| format!("{}={}", t.name, t.value))
                    .collect();
                println!("{}\t{}\t{}", point.name, point.value, tags.join(","));
            }
            Err(e) => println!("<{e}>"),
        }
    }

    Ok(())
}
