use std::fs::File;
use std::io::{prelude::*, stdin};
use std::path::PathBuf;

use clap::Parser;
use traghetto::{Model, Predictor, Tag};

#[derive(Parser, Debug)]
#[command(about = "A program to evaluate the accuracy of Traghetto.")]
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
    let mut n_tokens = 0u64;
    let mut n_correct = 0u64;
    for line in stdin().lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        // Gold lines are `token/TAG` pairs separated by whitespace; tags
        // may not contain `/` but tokens may, so split at the last one.
        let mut tokens = vec![];
        let mut gold = vec![];
        for pair in line.split_whitespace() {
            let (token, tag) = pair
                .rsplit_once('/')
                .ok_or_else(|| format!("missing tag annotation: {pair}"))?;
            let tag = Tag::from_name(tag).ok_or_else(|| format!("unknown tag: {tag}"))?;
            tokens.push(token);
            gold.push(tag);
        }
        let tags = predictor.predict(&tokens);
        n_tokens += tokens.len() as u64;
        n_correct += tags.iter().zip(&gold).filter(|(a, b)| a == b).count() as u64;
    }
    println!("{}", accuracy_report(n_correct, n_tokens));
    println!("Correct: {}, Total: {}", n_correct, n_tokens);

    Ok(())
}

fn accuracy_report(n_correct: u64, n_tokens: u64) -> String {
    if n_tokens == 0 {
        "Accuracy: n/a (no tokens)".to_string()
    } else {
        format!("Accuracy: {}", n_correct as f64 / n_tokens as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_report_empty_input() {
        assert_eq!("Accuracy: n/a (no tokens)", accuracy_report(0, 0));
    }

    #[test]
    fn test_accuracy_report() {
        assert_eq!("Accuracy: 0.75", accuracy_report(3, 4));
    }
}
