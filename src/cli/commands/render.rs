use crate::cli::Cli;
use crate::core::{RenderError, RenderResult, RenderSummary};
use crate::engine::{create_default_render_engine, create_quiet_render_engine, render_to_sink};
use crate::services::{sink_for_path, write_summary_json};

/// render コマンドの実行
///
/// 出力先の形式は最初に確認し、未対応ならレンダリングせずに設定エラーを返す。
pub fn execute_render(cli: &Cli) -> RenderResult<RenderSummary> {
    let config = cli.to_config();
    config.validate()?;
    let sink = sink_for_path(&cli.output).map_err(|e| RenderError::configuration(format!("{e:#}")))?;

    let summary = if cli.quiet {
        render_to_sink(&create_quiet_render_engine(config)?, &sink)?
    } else {
        render_to_sink(&create_default_render_engine(config)?, &sink)?
    };

    if let Some(path) = &cli.summary {
        write_summary_json(path, &summary).map_err(RenderError::persistence)?;
    }

    if !summary.is_complete() {
        log::warn!(
            "{} of {} regions failed and were left black",
            summary.faulted_regions,
            summary.total_regions
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_execute_render_writes_image_and_summary() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.ppm");
        let summary_path = temp_dir.path().join("summary.json");
        let output_arg = output.to_string_lossy().to_string();
        let summary_arg = summary_path.to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "tile_tracer",
            "--width",
            "16",
            "--height",
            "12",
            "-s",
            "1",
            "-q",
            "-o",
            output_arg.as_str(),
            "--summary",
            summary_arg.as_str(),
            "4",
            "3",
        ])
        .unwrap();

        let summary = execute_render(&cli).unwrap();

        assert_eq!(summary.total_regions, 16);
        assert!(summary.is_complete());
        assert!(std::fs::read_to_string(&output).unwrap().starts_with("P3\n16 12\n255\n"));
        assert!(summary_path.exists());
    }

    #[test]
    fn test_too_few_divisions_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.ppm");
        let output_arg = output.to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "tile_tracer",
            "--width",
            "16",
            "--height",
            "12",
            "-q",
            "-o",
            output_arg.as_str(),
            "8",
            "3",
        ])
        .unwrap();

        let error = execute_render(&cli).unwrap_err();

        assert!(error.is_configuration());
        assert!(!output.exists());
    }

    #[test]
    fn test_unsupported_output_extension_is_configuration_error() {
        let cli = Cli::try_parse_from(["tile_tracer", "-q", "-o", "out.unknown"]).unwrap();

        assert!(execute_render(&cli).unwrap_err().is_configuration());
    }
}
