use std::fs::File;
use std::io::{prelude::*, stderr, BufReader};
use std::path::PathBuf;

use clap::Parser;
use traghetto::Trainer;

#[derive(Parser, Debug)]
#[command(about = "A program to train models of Traghetto.")]
struct Args {
    /// A tagged dictionary file (termId, term, tag indices, tag frequencies)
    #[arg(long)]
    dict: PathBuf,

    /// A tag n-gram frequency file of the training split
    #[arg(long)]
    ngrams: PathBuf,

    /// A tag n-gram frequency file of the validation split, used together
    /// with --test to select the interpolation weights
    #[arg(long, requires = "test")]
    valid: Option<PathBuf>,

    /// A tag n-gram frequency file of the held-out test split
    #[arg(long, requires = "valid")]
    test: Option<PathBuf>,

    /// The file to write the trained model to
    #[arg(long)]
    model: PathBuf,
}

fn load_rows(path: &PathBuf) -> Result<Vec<String>, std::io::Error> {
    eprintln!("Loading {path:?} ...");
    let f = BufReader::new(File::open(path)?);
    let mut rows = vec![];
    for line in f.lines() {
        if rows.len() % 10000 == 0 {
            eprint!("# of rows: {}\r", rows.len());
            stderr().flush()?;
        }
        rows.push(line?);
    }
    eprintln!("# of rows: {}", rows.len());
    Ok(rows)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut trainer = Trainer::new();

    eprintln!("Training vocabulary...");
    trainer.train_vocabulary(load_rows(&args.dict)?)?;

    eprintln!("Training tag distribution...");
    trainer.train_tag_distribution(load_rows(&args.ngrams)?)?;

    if let (Some(valid), Some(test)) = (&args.valid, &args.test) {
        eprintln!("Selecting lambda...");
        let (lambda, test_score) = trainer.select_lambda(load_rows(valid)?, load_rows(test)?)?;
        eprintln!("Selected lambda: {:?}", lambda.weights());
        eprintln!("Test log-likelihood: {test_score}");
    }
    if trainer.n_skipped() != 0 {
        eprintln!("Skipped {} malformed rows", trainer.n_skipped());
    }

    eprintln!("Writing model...");
    let model = trainer.into_model()?;
    let mut f = zstd::Encoder::new(File::create(args.model)?, 19)?;
    model.write(&mut f)?;
    f.finish()?;
    eprintln!("Finish training.");

    Ok(())
}
