use clap::Parser;
use tile_tracer::cli::{execute_render, Cli};

fn main() {
    env_logger::init();

    // 引数の数や形式の誤りはclapが使い方を表示して終了する
    let cli = Cli::parse();

    match execute_render(&cli) {
        Ok(summary) => {
            if !cli.quiet {
                println!("📄 {} に保存しました", cli.output.display());
            }
            if !summary.is_complete() {
                eprintln!(
                    "⚠️  {}個の領域でエラーが発生しました",
                    summary.faulted_regions
                );
            }
        }
        Err(error) => {
            eprintln!("❌ エラー: {error}");
            std::process::exit(1);
        }
    }
}
