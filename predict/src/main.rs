use std::fs::File;
use std::io::{prelude::*, stdin};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use traghetto::{Model, Predictor};

#[derive(Parser, Debug)]
#[command(about = "A program to tag tokenized text.")]
struct Args {
    /// The model file to use when tagging text
    #[arg(long)]
    model: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Loading model file...");
    let mut f = zstd::Decoder::new(File::open(args.model)?)?;
    let model = Model::read(&mut f)?;
    let predictor = Predictor::new(model)?;

    eprintln!("Start tagging");
    let mut n_tokens = 0;
    let start = Instant::now();
    for line in stdin().lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let tags = predictor.predict(&tokens);
        n_tokens += tokens.len();
        let tagged: Vec<String> = tokens
            .iter()
            .zip(&tags)
            .map(|(token, tag)| format!("{token}/{tag}"))
            .collect();
        println!("{}", tagged.join(" "));
    }
    let duration = start.elapsed();
    eprintln!("Elapsed: {} [sec]", duration.as_secs_f64());
    eprintln!(
        "Speed: {} [tokens/sec]",
        n_tokens as f64 / duration.as_secs_f64()
    );

    Ok(())
}
