#![forbid(unsafe_code)]

//! LaTeX toolchain seam: run the configured compiler on `resume.tex` and
//! verify the produced PDF.

use std::path::Path;
use std::process::Command;

pub(crate) const DEFAULT_PDFLATEX_CMD: &str = "pdflatex";

pub(crate) fn compile_resume_pdf(tex_path: &Path, pdflatex_cmd: &str) -> Result<(), String> {
    let dir = tex_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| "resume.tex path has no parent directory".to_string())?;
    let file_name = tex_path
        .file_name()
        .ok_or_else(|| "resume.tex path has no file name".to_string())?;

    let mut parts = pdflatex_cmd.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| "pdflatex command must not be empty".to_string())?;

    let output = Command::new(program)
        .args(parts)
        .arg("-interaction=nonstopmode")
        .arg(file_name)
        .current_dir(dir)
        .output()
        .map_err(|err| format!("failed to run {program}: {err}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let summary = stderr
            .lines()
            .chain(stdout.lines())
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string();
        return Err(format!(
            "LaTeX compile failed ({}): {summary}",
            output.status
        ));
    }
    Ok(())
}

pub(crate) fn verify_pdf(pdf_path: &Path) -> Result<(), String> {
    let name = pdf_path.to_string_lossy();
    let metadata = std::fs::metadata(pdf_path)
        .map_err(|_| format!("resume.pdf was not produced: {name}"))?;
    if metadata.len() == 0 {
        return Err(format!("resume.pdf is empty after compile: {name}"));
    }
    Ok(())
}
