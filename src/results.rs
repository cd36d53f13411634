//! Intermediate result files exchanged with the solver
//!
//! File layouts, all comma separated, one record per line:
//! - gap file: `node, gap`
//! - node seed file: `*NODE, NSET=PIPE` header then `node, x, y, 0`
//! - frequency file: one frequency per mode, ascending mode index
//! - mode file `mode_<n>.dat`: one `u1, u2, u3` row per node

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use regex::Regex;

use crate::deck::sci_width;
use crate::error::{PipelineError, PipelineResult};
use crate::postprocess::RawModeShape;
use crate::seabed::Gap;

pub const GAP_FILE: &str = "gaps.dat";
pub const NODE_FILE: &str = "in_place_nodes.dat";
pub const FREQUENCY_FILE: &str = "freqs.dat";
pub const MODE_FILE_PREFIX: &str = "mode_";

fn read_existing(path: &Path) -> PipelineResult<String> {
    if !path.is_file() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn parse_field<T: std::str::FromStr>(field: &str, path: &Path, line_no: usize) -> PipelineResult<T> {
    field.trim().parse::<T>().map_err(|_| {
        PipelineError::inconsistent(format!(
            "{}:{}: cannot parse '{}'",
            path.display(),
            line_no,
            field.trim()
        ))
    })
}

/// Data lines with their 1-based line numbers, blank lines skipped
fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn check_sequence(node: usize, expected: usize, path: &Path, line_no: usize) -> PipelineResult<()> {
    if node != expected {
        return Err(PipelineError::inconsistent(format!(
            "{}:{}: node {} out of sequence, expected {}",
            path.display(),
            line_no,
            node,
            expected
        )));
    }
    Ok(())
}

/// Read the static gap file. Node numbers must run 1, 2, 3, ... without holes.
pub fn read_gaps(path: &Path) -> PipelineResult<Vec<Gap>> {
    let content = read_existing(path)?;
    let mut gaps = Vec::new();

    for (line_no, line) in data_lines(&content) {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            return Err(PipelineError::inconsistent(format!(
                "{}:{}: expected 'node, gap', got '{}'",
                path.display(),
                line_no,
                line
            )));
        }
        let node: usize = parse_field(fields[0], path, line_no)?;
        let gap: f64 = parse_field(fields[1], path, line_no)?;

        check_sequence(node, gaps.len() + 1, path, line_no)?;
        gaps.push(Gap::new(node, gap));
    }

    if gaps.is_empty() {
        return Err(PipelineError::inconsistent(format!("{} holds no gaps", path.display())));
    }
    Ok(gaps)
}

pub fn format_gap_line(gap: &Gap) -> String {
    format!("{:4}, {}", gap.node, sci_width(gap.gap, 9, 3))
}

pub fn write_gaps(path: &Path, gaps: &[Gap]) -> PipelineResult<()> {
    let mut content = String::new();
    for g in gaps {
        content.push_str(&format_gap_line(g));
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Displaced node position from the static run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePosition {
    pub node: usize,
    pub x: f64,
    pub y: f64,
}

pub fn format_node_line(node: &NodePosition) -> String {
    format!(
        "{:4}, {}, {}, 0",
        node.node,
        sci_width(node.x, 9, 3),
        sci_width(node.y, 9, 3)
    )
}

/// Read the node seed file written for the modal model. Node numbers must
/// run 1, 2, 3, ... like the gap file.
pub fn read_nodes(path: &Path) -> PipelineResult<Vec<NodePosition>> {
    let content = read_existing(path)?;
    let mut nodes = Vec::new();

    for (line_no, line) in data_lines(&content) {
        if line.starts_with('*') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            return Err(PipelineError::inconsistent(format!(
                "{}:{}: expected 'node, x, y, z', got '{}'",
                path.display(),
                line_no,
                line
            )));
        }
        let node: usize = parse_field(fields[0], path, line_no)?;
        check_sequence(node, nodes.len() + 1, path, line_no)?;
        nodes.push(NodePosition {
            node,
            x: parse_field(fields[1], path, line_no)?,
            y: parse_field(fields[2], path, line_no)?,
        });
    }
    Ok(nodes)
}

pub fn write_nodes(path: &Path, nodes: &[NodePosition]) -> PipelineResult<()> {
    let mut content = String::from("*NODE, NSET=PIPE\n");
    for n in nodes {
        content.push_str(&format_node_line(n));
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Read natural frequencies in mode order. Every value must be positive.
pub fn read_frequencies(path: &Path) -> PipelineResult<Vec<f64>> {
    let content = read_existing(path)?;
    let mut freqs = Vec::new();
    for (line_no, line) in data_lines(&content) {
        let f: f64 = parse_field(line, path, line_no)?;
        if !(f.is_finite() && f > 0.0) {
            return Err(PipelineError::inconsistent(format!(
                "{}:{}: frequency {} is not positive",
                path.display(),
                line_no,
                f
            )));
        }
        freqs.push(f);
    }
    Ok(freqs)
}

pub fn write_frequencies(path: &Path, freqs: &[f64]) -> PipelineResult<()> {
    let content: String = freqs.iter().map(|f| format!("{:.18e}\n", f)).collect();
    fs::write(path, content)?;
    Ok(())
}

/// Read one mode file into a node-by-component table
pub fn read_mode_table(path: &Path) -> PipelineResult<RawModeShape> {
    let content = read_existing(path)?;
    let mut rows = Vec::new();
    for (line_no, line) in data_lines(&content) {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            return Err(PipelineError::inconsistent(format!(
                "{}:{}: expected 3 displacement components, got {}",
                path.display(),
                line_no,
                fields.len()
            )));
        }
        rows.push(Vector3::new(
            parse_field(fields[0], path, line_no)?,
            parse_field(fields[1], path, line_no)?,
            parse_field(fields[2], path, line_no)?,
        ));
    }
    if rows.is_empty() {
        return Err(PipelineError::inconsistent(format!("{} holds no nodes", path.display())));
    }
    Ok(RawModeShape::new(rows))
}

pub fn write_mode_table(path: &Path, shape: &RawModeShape) -> PipelineResult<()> {
    let content: String = shape
        .rows()
        .iter()
        .map(|r| format!("{:.18e},{:.18e},{:.18e}\n", r.x, r.y, r.z))
        .collect();
    fs::write(path, content)?;
    Ok(())
}

/// Access to the modal job's extracted results
pub trait ModalResultSource {
    /// Natural frequencies in mode order
    fn frequencies(&self) -> PipelineResult<Vec<f64>>;

    /// Raw mode shapes keyed by 1-based mode number, ascending
    fn mode_shapes(&self) -> PipelineResult<Vec<(usize, RawModeShape)>>;
}

/// Modal results left as text files in a work directory
pub struct WorkDirResults {
    dir: PathBuf,
    mode_pattern: Regex,
}

impl WorkDirResults {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let pattern = format!(r"^{}(\d+)\.dat$", regex::escape(MODE_FILE_PREFIX));
        Self {
            dir: dir.into(),
            mode_pattern: Regex::new(&pattern).expect("mode file pattern is valid"),
        }
    }

    /// Mode files present in the directory, sorted by mode number
    pub fn mode_files(&self) -> PipelineResult<Vec<(usize, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(caps) = self.mode_pattern.captures(name) {
                let index: usize = caps[1].parse().map_err(|_| {
                    PipelineError::inconsistent(format!("bad mode number in {}", name))
                })?;
                files.push((index, entry.path()));
            }
        }
        files.sort_by_key(|(index, _)| *index);
        Ok(files)
    }
}

impl ModalResultSource for WorkDirResults {
    fn frequencies(&self) -> PipelineResult<Vec<f64>> {
        read_frequencies(&self.dir.join(FREQUENCY_FILE))
    }

    fn mode_shapes(&self) -> PipelineResult<Vec<(usize, RawModeShape)>> {
        self.mode_files()?
            .into_iter()
            .map(|(index, path)| Ok((index, read_mode_table(&path)?)))
            .collect()
    }
}
