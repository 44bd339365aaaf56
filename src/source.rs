// src/source.rs
//
// Recorded tracker output. Each source is a JSONL file: a header line with
// the video geometry, then one line per frame with the tracked boxes.
//
//   {"fps": 25.0, "width": 1280, "height": 720}
//   {"frame_index": 0, "image": "frames/000000.jpg", "observations": [
//       {"track_id": 1, "class_id": 2, "bbox": [412.0, 300.5, 520.2, 388.9]}]}

use crate::pipeline::frame_context::{FrameContext, FrameImage};
use crate::types::{InputConfig, TrackObservation};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const STREAM_EXTENSIONS: [&str; 2] = ["jsonl", "JSONL"];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StreamHeader {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct FrameLine {
    frame_index: u64,
    #[serde(default)]
    image: Option<PathBuf>,
    #[serde(default)]
    observations: Vec<TrackObservation>,
}

pub struct SourceFinder {
    input: InputConfig,
}

impl SourceFinder {
    pub fn new(input: InputConfig) -> Self {
        Self { input }
    }

    /// All observation streams under the input directory, sorted by path.
    pub fn find_streams(&self) -> Result<Vec<PathBuf>> {
        let mut streams = Vec::new();

        for entry in WalkDir::new(&self.input.dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                if STREAM_EXTENSIONS.contains(&ext.to_str().unwrap_or("")) {
                    streams.push(path.to_path_buf());
                }
            }
        }

        streams.sort();
        info!("Found {} observation stream(s)", streams.len());
        Ok(streams)
    }
}

pub struct ObservationStream {
    path: PathBuf,
    base_dir: PathBuf,
    header: StreamHeader,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    skipped_lines: usize,
}

impl ObservationStream {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening stream: {}", path.display());

        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(line) => line?,
            None => bail!("{} is empty, expected a header line", path.display()),
        };
        let header: StreamHeader = serde_json::from_str(&header_line)
            .with_context(|| format!("parsing header of {}", path.display()))?;

        if !(header.fps.is_finite() && header.fps > 0.0) {
            bail!("{}: invalid fps {}", path.display(), header.fps);
        }

        info!(
            "Stream properties: {}x{} @ {:.1} FPS",
            header.width, header.height, header.fps
        );

        Ok(Self {
            path: path.to_path_buf(),
            base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            header,
            lines,
            line_no: 1,
            skipped_lines: 0,
        })
    }

    pub fn header(&self) -> StreamHeader {
        self.header
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Next well-formed frame. Unparseable lines are logged and skipped;
    /// only I/O errors are returned.
    pub fn next_frame(&mut self) -> Result<Option<FrameContext>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let parsed: FrameLine = match serde_json::from_str(&line) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(
                        "{}:{}: skipping malformed frame line: {}",
                        self.path.display(),
                        self.line_no,
                        e
                    );
                    self.skipped_lines += 1;
                    continue;
                }
            };

            let mut ctx = FrameContext::new(parsed.frame_index, parsed.observations);
            if let Some(image) = parsed.image {
                ctx = ctx.with_image(FrameImage::File(self.base_dir.join(image)));
            }
            return Ok(Some(ctx));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_stream(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_reads_header_and_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_stream(
            dir.path(),
            "cam1.jsonl",
            concat!(
                "{\"fps\": 25.0, \"width\": 1280, \"height\": 720}\n",
                "{\"frame_index\": 0, \"image\": \"f/0.jpg\", \"observations\": [{\"track_id\": 3, \"class_id\": 2, \"bbox\": [10.7, 20, 30, 40]}]}\n",
                "\n",
                "not json\n",
                "{\"frame_index\": 1}\n",
            ),
        );

        let mut stream = ObservationStream::open(&path).unwrap();
        assert_eq!(
            stream.header(),
            StreamHeader {
                fps: 25.0,
                width: 1280,
                height: 720
            }
        );

        let first = stream.next_frame().unwrap().unwrap();
        assert_eq!(first.frame_index, 0);
        assert_eq!(first.observations.len(), 1);
        assert_eq!(first.observations[0].bbox.x1, 10);
        match &first.image {
            Some(FrameImage::File(p)) => assert_eq!(p, &dir.path().join("f/0.jpg")),
            other => panic!("unexpected image {:?}", other),
        }

        let second = stream.next_frame().unwrap().unwrap();
        assert_eq!(second.frame_index, 1);
        assert!(second.observations.is_empty());
        assert_eq!(stream.skipped_lines(), 1);
        assert!(stream.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_rejects_empty_or_bad_header() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_stream(dir.path(), "empty.jsonl", "");
        assert!(ObservationStream::open(&empty).is_err());
        let zero_fps = write_stream(
            dir.path(),
            "zero.jsonl",
            "{\"fps\": 0, \"width\": 10, \"height\": 10}\n",
        );
        assert!(ObservationStream::open(&zero_fps).is_err());
    }

    #[test]
    fn test_finds_streams_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("north")).unwrap();
        write_stream(dir.path(), "a.jsonl", "");
        write_stream(&dir.path().join("north"), "b.jsonl", "");
        write_stream(dir.path(), "notes.txt", "");

        let finder = SourceFinder::new(InputConfig {
            dir: dir.path().to_string_lossy().into_owned(),
        });
        let found = finder.find_streams().unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() == "jsonl"));
    }
}
