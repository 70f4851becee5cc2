use std::path::PathBuf;

use clap::Parser;
use terraforge::preview::{save_biome_png, save_elevation_png};
use terraforge::{generate, HostAdapter, MockAdapter, WorldParams};

/// Детерминированный генератор карт для пошаговых стратегий
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: PathBuf,

    /// Каталог для превью-PNG (по умолчанию: текущий)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let params = WorldParams::from_toml_file(
        cli.config.to_str().ok_or("config path is not valid UTF-8")?,
    )?;
    println!(
        "Генерация карты {}×{} (сид {})...",
        params.width, params.height, params.seed
    );

    let dims = params.dimensions();
    let mut adapter = MockAdapter::new(dims, params.seed);
    let result = generate(&params, &mut adapter)?;

    for warning in &result.warnings {
        eprintln!("предупреждение: {warning}");
    }

    // Снимаем буферы с адаптера для превью
    let mut elevation = Vec::with_capacity(dims.size());
    let mut biome = Vec::with_capacity(dims.size());
    for y in 0..dims.height {
        for x in 0..dims.width {
            elevation.push(adapter.elevation(x, y) as i16);
            biome.push(adapter.biome(x, y));
        }
    }

    let elevation_path = cli.output.join("elevation.png");
    let biome_path = cli.output.join("biomes.png");
    save_elevation_png(
        dims,
        &elevation,
        elevation_path.to_str().ok_or("output path is not valid UTF-8")?,
    )?;
    save_biome_png(
        dims,
        &biome,
        &result.starts,
        biome_path.to_str().ok_or("output path is not valid UTF-8")?,
    )?;

    println!(
        "Готово: {} стартов, {} чудес, {} ресурсов.",
        result.starts.len(),
        result.natural_wonders,
        result.resources
    );
    println!("Превью: {elevation_path:?}, {biome_path:?}");
    Ok(())
}
