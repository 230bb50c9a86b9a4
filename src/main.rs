//! dice - roll tabletop dice notation from the command line

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rpg_dice_parser::{
    roll_with_engine, substitute_statistics, Engine, RollOptions, SortOrder,
    DEFAULT_MAX_BULK_COUNT,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dice", version, about = "Roll tabletop dice notation")]
struct Args {
    /// The notation, `2d6+3>=10`, `5#1d20`, `1d20;&+2`...
    #[arg(required = true)]
    notation: Vec<String>,

    /// Reroll failed comparisons
    #[arg(long)]
    pity: bool,

    /// Order of the dice: asc, desc or none
    #[arg(long, default_value_t = SortOrder::None)]
    sort: SortOrder,

    /// Random source: thread, os or seeded:<n>
    #[arg(long, default_value_t = Engine::Thread)]
    engine: Engine,

    /// Most repetitions a bulk roll may ask for
    #[arg(long, default_value_t = DEFAULT_MAX_BULK_COUNT)]
    max_bulk: u32,

    /// Character statistic replaced in the notation, `--stat strength=14`
    #[arg(long = "stat", value_parser = parse_stat)]
    stats: Vec<(String, f64)>,

    /// Value of `$` in the notation
    #[arg(long)]
    placeholder: Option<String>,
}

fn parse_stat(arg: &str) -> Result<(String, f64)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected `name=value`, got `{arg}`"))?;
    let value = value
        .trim()
        .parse()
        .with_context(|| format!("`{value}` is not a number"))?;
    Ok((name.trim().to_owned(), value))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rpg_dice_parser=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut notation = args.notation.join(" ");
    if !args.stats.is_empty() || args.placeholder.is_some() {
        let stats: BTreeMap<String, f64> = args.stats.into_iter().collect();
        notation = substitute_statistics(&notation, &stats, args.placeholder.as_deref())?;
    }

    let options = RollOptions::default()
        .pity(args.pity)
        .sort(args.sort)
        .max_bulk_count(Some(args.max_bulk));

    let Some(rolled) = roll_with_engine(&notation, options, args.engine)
        .with_context(|| format!("Failed to roll `{notation}`"))?
    else {
        println!("`{notation}` has no dice to roll");
        return Ok(());
    };

    for line in rolled.result.split(';') {
        println!("{}", line.trim());
    }
    println!("total: {}", rolled.total);
    if let Some(comment) = &rolled.comment {
        println!("comment: {comment}");
    }
    if let Some(compare) = &rolled.compare {
        println!("compared to: {}{}", compare.sign, compare.value);
    }
    if let Some(rerolls) = rolled.pity_logs {
        println!("pity rerolls: {rerolls}");
    }
    if rolled.trivial {
        println!("the comparison does not depend on the dice");
    }

    Ok(())
}
