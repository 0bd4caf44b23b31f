// データ永続化の具象実装

use crate::core::{ImageSink, RenderSummary, Rgb8Image};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// 画像をプレーンPPM（P3）形式で書き出す
///
/// ヘッダー `P3\n{W} {H}\n255\n` の後、上の行から1ピクセル1行で `R G B` を出力する。
pub fn encode_ppm<W: Write>(image: &Rgb8Image, writer: &mut W) -> io::Result<()> {
    write!(writer, "P3\n{} {}\n255\n", image.width, image.height)?;
    for [r, g, b] in &image.pixels {
        writeln!(writer, "{r} {g} {b}")?;
    }
    Ok(())
}

/// 親ディレクトリが存在しない場合は作成
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("ディレクトリ作成エラー: {e}"))?;
    }
    Ok(())
}

/// PPMファイルへの出力実装
#[derive(Debug, Clone)]
pub struct PpmSink {
    path: PathBuf,
}

impl PpmSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSink for PpmSink {
    fn write_image(&self, image: &Rgb8Image) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let file = File::create(&self.path)
            .map_err(|e| anyhow::anyhow!("ファイル作成エラー: {e}"))?;
        let mut writer = BufWriter::new(file);
        encode_ppm(image, &mut writer).map_err(|e| anyhow::anyhow!("書き込みエラー: {e}"))?;
        writer
            .flush()
            .map_err(|e| anyhow::anyhow!("フラッシュエラー: {e}"))?;
        log::debug!("wrote {}", self.path.display());
        Ok(())
    }
}

/// `image` クレートによる出力実装（PNGなど、形式は拡張子から判定）
#[derive(Debug, Clone)]
pub struct ImageFileSink {
    path: PathBuf,
}

impl ImageFileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSink for ImageFileSink {
    fn write_image(&self, image: &Rgb8Image) -> Result<()> {
        let width = u32::try_from(image.width)
            .with_context(|| format!("画像の幅 {} が大きすぎます", image.width))?;
        let height = u32::try_from(image.height)
            .with_context(|| format!("画像の高さ {} が大きすぎます", image.height))?;
        let raw: Vec<u8> = image.pixels.iter().flatten().copied().collect();
        let buffer = image::RgbImage::from_raw(width, height, raw)
            .context("画素数が画像サイズと一致しません")?;

        ensure_parent_dir(&self.path)?;
        buffer
            .save(&self.path)
            .with_context(|| format!("画像の保存に失敗しました: {}", self.path.display()))?;
        log::debug!("wrote {}", self.path.display());
        Ok(())
    }
}

/// メモリ内保存の出力実装（テスト用）
///
/// 書き込まれた画像をPPM形式のバイト列として保持する。
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されたバイト列を取得
    pub fn contents(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 保存された内容を文字列として取得
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl ImageSink for MemorySink {
    fn write_image(&self, image: &Rgb8Image) -> Result<()> {
        let mut encoded = Vec::new();
        encode_ppm(image, &mut encoded)?;
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = encoded;
        Ok(())
    }
}

/// 拡張子に応じた出力先を作成
///
/// `.ppm` はPPM出力、それ以外は `image` クレートが対応する形式のみ受け付ける。
pub fn sink_for_path(path: &Path) -> Result<Box<dyn ImageSink>> {
    let is_ppm = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));
    if is_ppm {
        return Ok(Box::new(PpmSink::new(path)));
    }

    image::ImageFormat::from_path(path)
        .with_context(|| format!("未対応の出力形式です: {}", path.display()))?;
    Ok(Box::new(ImageFileSink::new(path)))
}

/// 実行サマリーをJSONファイルへ保存
pub fn write_summary_json(path: &Path, summary: &RenderSummary) -> Result<()> {
    ensure_parent_dir(path)?;
    let json_str = serde_json::to_string_pretty(summary)
        .map_err(|e| anyhow::anyhow!("JSON変換エラー: {e}"))?;
    fs::write(path, json_str).map_err(|e| anyhow::anyhow!("書き込みエラー: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MockImageSink;
    use chrono::Utc;
    use tempfile::TempDir;

    fn checker(width: usize, height: usize) -> Rgb8Image {
        let pixels = (0..width * height)
            .map(|i| if i % 2 == 0 { [255, 0, 0] } else { [0, 0, 255] })
            .collect();
        Rgb8Image {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_encode_ppm_format() {
        let mut out = Vec::new();
        encode_ppm(&checker(2, 1), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "P3\n2 1\n255\n255 0 0\n0 0 255\n");
    }

    #[test]
    fn test_ppm_sink_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.ppm");
        let sink = PpmSink::new(&path);

        sink.write_image(&checker(4, 3)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(&lines[..3], &["P3", "4 3", "255"]);
        assert_eq!(lines.len(), 3 + 12);
    }

    #[test]
    fn test_image_file_sink_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.png");

        ImageFileSink::new(&path).write_image(&checker(4, 3)).unwrap();

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(loaded.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_image_file_sink_rejects_short_pixels() {
        let temp_dir = TempDir::new().unwrap();
        let mut image = checker(4, 3);
        image.pixels.pop();

        let result = ImageFileSink::new(temp_dir.path().join("out.png")).write_image(&image);
        assert!(result.is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_image_file_sink_rejects_oversized_width() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.png");
        let image = Rgb8Image {
            width: u32::MAX as usize + 1,
            height: 0,
            pixels: Vec::new(),
        };

        let error = ImageFileSink::new(&path).write_image(&image).unwrap_err();

        assert!(error.to_string().contains("大きすぎます"));
        assert!(!path.exists());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        let shared = sink.clone();

        sink.write_image(&checker(1, 1)).unwrap();

        assert_eq!(shared.contents_string(), "P3\n1 1\n255\n255 0 0\n");
    }

    #[test]
    fn test_sink_for_path_by_extension() {
        assert!(sink_for_path(Path::new("image.ppm")).is_ok());
        assert!(sink_for_path(Path::new("IMAGE.PPM")).is_ok());
        assert!(sink_for_path(Path::new("image.png")).is_ok());
        assert!(sink_for_path(Path::new("image.unknown")).is_err());
        assert!(sink_for_path(Path::new("image")).is_err());
    }

    #[test]
    fn test_boxed_sink_delegates() {
        let mut mock = MockImageSink::new();
        mock.expect_write_image()
            .withf(|image| image.width == 2 && image.height == 1)
            .times(1)
            .returning(|_| Ok(()));

        let sink: Box<dyn ImageSink> = Box::new(mock);
        sink.write_image(&checker(2, 1)).unwrap();
    }

    #[test]
    fn test_write_summary_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("summary.json");
        let summary = RenderSummary {
            width: 4,
            height: 3,
            samples: 1,
            x_step: 2,
            y_step: 1,
            thread_count: 2,
            queue_mode: "spin".to_string(),
            total_regions: 6,
            completed_regions: 6,
            faulted_regions: 0,
            elapsed_ms: 1,
            max_depth: 7,
            rendered_at: Utc::now(),
        };

        write_summary_json(&path, &summary).unwrap();

        let restored: RenderSummary =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, summary);
    }
}
