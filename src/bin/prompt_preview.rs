use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mintforge::catalog::Catalog;
use mintforge::prompt::{PromptOptions, StyleDescriptors, compose};
use mintforge::random::{SharedRng, from_entropy, seeded};
use mintforge::rarity;
use mintforge::sampler::{ForcedTraits, sample_traits};

/// Sample traits and print the prompts they produce, without calling any
/// external service.
#[derive(Parser, Debug)]
#[command(name = "prompt_preview")]
struct Args {
    /// How many previews to print
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Add the high-priority flat style clause
    #[arg(long)]
    stronger_style: bool,

    /// Use this character instead of sampling one
    #[arg(long)]
    character: Option<String>,

    /// Use this action instead of sampling one
    #[arg(long)]
    action: Option<String>,

    /// Use this background instead of sampling one
    #[arg(long)]
    background: Option<String>,

    /// Use this color scheme instead of sampling one
    #[arg(long)]
    color_scheme: Option<String>,

    /// Seed the random source so the same previews print every run
    #[arg(long)]
    seed: Option<u64>,

    /// Catalog JSON replacing the bundled one
    #[arg(long, env = "MINTFORGE_CATALOG")]
    catalog: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let catalog = Catalog::load(args.catalog.as_deref()).context("Failed to load catalog")?;

    let forced = ForcedTraits {
        character: args.character,
        action: args.action,
        background: args.background,
        color_scheme: args.color_scheme,
        effects: None,
    };
    let options = PromptOptions {
        stronger_style: args.stronger_style,
        collection_tags: Vec::new(),
    };

    let mut rng: SharedRng = match args.seed {
        Some(seed) => Box::new(seeded(seed)),
        None => Box::new(from_entropy()),
    };
    for index in 1..=args.count {
        let roll = rarity::resolve(&mut *rng);
        let traits = sample_traits(&catalog.traits, &forced, roll.tier, &mut *rng);
        let style = StyleDescriptors::sample(&catalog.styles, &mut *rng);
        let prompts = compose(&traits, &style, &options, &catalog.motions);

        println!("#{index} {} ({:.4} ETH)", roll.tier, roll.value);
        println!("  character:    {}", traits.character);
        println!("  action:       {}", traits.action);
        println!("  background:   {}", traits.background);
        println!("  color scheme: {}", traits.color_scheme);
        println!("  effects:      {}", traits.effects.join(", "));
        println!("  image prompt: {}", prompts.image);
        println!("  video prompt: {}", prompts.video);
        println!();
    }
    Ok(())
}
