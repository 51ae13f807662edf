use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use std::path::PathBuf;
use tpsl_ml::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tpsl-ml")]
#[command(about = "ML entry / take-profit stop-loss exit strategy and feature diagnostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

//strategy parameters shared by train and run, each overrides the config file
#[derive(Args)]
struct StrategyArgs {
    //path to a json strategy config
    #[arg(long)]
    config: Option<PathBuf>,

    //comma separated feature columns
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,

    //take-profit threshold (fractional return)
    #[arg(long)]
    tp: Option<f64>,

    //stop-loss threshold (fractional return, negative)
    #[arg(long, allow_hyphen_values = true)]
    sl: Option<f64>,

    //trading cost per round trip (fractional)
    #[arg(long)]
    cost: Option<f64>,

    //leverage applied to exit returns
    #[arg(long)]
    leverage: Option<f64>,

    //starting balance for the compounded return curve
    #[arg(long, default_value = "100000")]
    initial_balance: f64,

    //output path for trades csv
    #[arg(long)]
    output_trades_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    //train the model on the data window and replay the strategy in-sample
    Train {
        //path to csv bar data
        #[arg(long)]
        data: PathBuf,

        //path to csv training data with a dummy label column
        #[arg(long)]
        training_data: PathBuf,

        //keep only the first n training rows
        #[arg(long)]
        training_rows: Option<usize>,

        //save the fitted model and scaler under this name
        #[arg(long)]
        save_name: Option<String>,

        //directory for saved artifacts
        #[arg(long, default_value = "models/saved")]
        model_dir: PathBuf,

        #[command(flatten)]
        strategy: StrategyArgs,
    },

    //replay the strategy with a saved model and scaler
    Run {
        //path to csv bar data
        #[arg(long)]
        data: PathBuf,

        //saved model artifact
        #[arg(long)]
        model: PathBuf,

        //saved scaler artifact
        #[arg(long)]
        scaler: PathBuf,

        #[command(flatten)]
        strategy: StrategyArgs,
    },

    //variance inflation factors, pruned down to a threshold
    Vif {
        //path to csv feature data
        #[arg(long)]
        data: PathBuf,

        //maximum vif kept after pruning
        #[arg(long, default_value_t = DEFAULT_VIF_THRESHOLD)]
        threshold: f64,

        //print the unpruned table only
        #[arg(long)]
        all: bool,
    },

    //pearson and spearman correlation heatmaps
    Correlations {
        //path to csv feature data
        #[arg(long)]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            training_data,
            training_rows,
            save_name,
            model_dir,
            strategy,
        } => {
            let mut config = base_config(&strategy)?;
            config.train_mode = true;
            config.training_data = Some(training_data);
            if training_rows.is_some() {
                config.training_rows = training_rows;
            }

            let trained = run_strategy(&data, &config, &strategy)?;

            if let Some(name) = save_name {
                let (model_path, scaler_path) = trained.artifacts().save(&model_dir, &name)?;
                println!("\nModel saved to {:?}", model_path);
                println!("Scaler saved to {:?}", scaler_path);
            }
        }
        Commands::Run {
            data,
            model,
            scaler,
            strategy,
        } => {
            let mut config = base_config(&strategy)?;
            config.train_mode = false;
            config.model_path = Some(model);
            config.scaler_path = Some(scaler);

            run_strategy(&data, &config, &strategy)?;
        }
        Commands::Vif {
            data,
            threshold,
            all,
        } => {
            let frame = FeatureFrame::from_csv(&data)
                .context(format!("Failed to load features from {:?}", data))?
                .drop_non_finite_rows();

            let (title, vif) = if all {
                ("Variance Inflation Factors", calculate_vif(&frame))
            } else {
                (
                    "Variance Inflation Factors (pruned)",
                    remove_intercollinearity(&frame, threshold),
                )
            };

            println!("{}", title);
            let mut table = Table::new();
            table.add_row(Row::new(vec![Cell::new("Feature"), Cell::new("VIF")]));
            for (feature, value) in &vif {
                table.add_row(Row::new(vec![
                    Cell::new(feature),
                    Cell::new(&format!("{:.2}", value)),
                ]));
            }
            table.printstd();

            if !all {
                println!(
                    "\nKept {} of {} features (threshold {})",
                    vif.len(),
                    frame.n_cols(),
                    threshold
                );
            }
        }
        Commands::Correlations { data } => {
            let frame = FeatureFrame::from_csv(&data)
                .context(format!("Failed to load features from {:?}", data))?;
            correlation_graphs(&frame);
        }
    }

    Ok(())
}

//config file (or defaults) with command line overrides applied
fn base_config(args: &StrategyArgs) -> Result<StrategyConfig> {
    let mut config = match &args.config {
        Some(path) => StrategyConfig::from_json_file(path)?,
        None => StrategyConfig::default(),
    };

    if let Some(features) = &args.features {
        config.list_x = features.clone();
    }
    if let Some(tp) = args.tp {
        config.tp = tp;
    }
    if let Some(sl) = args.sl {
        config.sl = sl;
    }
    if let Some(cost) = args.cost {
        config.cost = cost;
    }
    if let Some(leverage) = args.leverage {
        config.leverage = leverage;
    }

    Ok(config)
}

fn run_strategy(
    data_path: &PathBuf,
    config: &StrategyConfig,
    args: &StrategyArgs,
) -> Result<MlTpSlStrategy> {
    println!("ML TP/SL Strategy");
    println!("=================\n");

    let parameters = config.resolve()?;

    println!("Loading data from {:?}...", data_path);
    let bars = load_csv(data_path)
        .context(format!("Failed to load data from {:?}", data_path))?
        .drop_non_finite();

    if bars.is_empty() {
        anyhow::bail!("No usable rows in {:?}", data_path);
    }

    if let (Some(first), Some(last)) = (bars.first_timestamp(), bars.last_timestamp()) {
        println!("Loaded {} bars", bars.len());
        println!("Date range: {} to {}\n", first, last);
    }

    println!(
        "Mode: {}",
        if parameters.mode.is_train() {
            "train"
        } else {
            "inference"
        }
    );
    println!("Features: {}", parameters.list_x.join(", "));
    println!(
        "TP: {} | SL: {} | Cost: {} | Leverage: {}\n",
        parameters.exit.tp, parameters.exit.sl, parameters.exit.cost, parameters.exit.leverage
    );

    let timestamps = bars.timestamps();
    let mut strategy = MlTpSlStrategy::new(bars, parameters)?;

    let engine = ReplayEngine::new(ReplayConfig {
        initial_balance: args.initial_balance,
    });
    let result = engine.run(&mut strategy, &timestamps);

    println!("Results");
    println!("=======\n");
    result.summary.pretty_print_table();

    if let Some((side, position)) = &result.open_position {
        println!(
            "\nOpen {:?} position since {} at {}",
            side, position.entry_time, position.entry_price
        );
    }

    if let Some(trades_path) = &args.output_trades_csv {
        save_trades_csv(&result.trades, trades_path)?;
        println!("\nTrades saved to {:?}", trades_path);
    }

    Ok(strategy)
}

fn save_trades_csv(trades: &[Trade], path: &PathBuf) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "side,entry_time,exit_time,entry_price,return_pct")?;

    for trade in trades {
        writeln!(
            file,
            "{:?},{},{},{},{}",
            trade.side,
            trade.entry_time.to_rfc3339(),
            trade.exit_time.to_rfc3339(),
            trade.entry_price,
            trade.return_pct
        )?;
    }

    Ok(())
}
