use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use mf_audio::pipeline::MfccPipeline;
use mf_core::config::MfccConfig;
use mf_core::signal::Signal;

pub mod cli;

use cli::{Cli, FeatureKind, OutputFormat};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 4. Construire le pipeline (validation complète avant tout calcul)
    let pipeline = MfccPipeline::new(&config, cli.sample_rate)
        .context("Configuration MFCC rejetée")?;

    // 5. Générer le signal de test
    let signal = match cli.tone {
        Some(freq) => Signal::sine(freq, cli.amplitude, cli.duration, cli.sample_rate)?,
        None => {
            log::info!("Aucune fréquence --tone : analyse d'un silence.");
            Signal::silence(cli.duration, cli.sample_rate)?
        }
    };

    // 6. Calculer
    let matrix = match cli.features {
        FeatureKind::Mfcc => pipeline.compute(&signal)?,
        FeatureKind::Fbank => pipeline.log_mel_energies(&signal)?,
        FeatureKind::Spectrogram => pipeline.log_spectrogram(&signal)?,
    };
    log::info!(
        "{} frames × {} valeurs ({:?})",
        matrix.len(),
        matrix.width(),
        cli.features
    );

    // 7. Écrire le résultat
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.format {
        OutputFormat::Table => matrix.write_table(&mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut out, &matrix).context("Sérialisation JSON impossible")?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Load `--config` if it exists, otherwise fall back to defaults.
fn resolve_config(cli: &Cli) -> Result<MfccConfig> {
    if cli.config.exists() {
        mf_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(MfccConfig::default())
    }
}
