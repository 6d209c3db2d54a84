// Backup task: archive the decompiled sources before they are overwritten

use super::stage::{FnStage, Stage, StageContext, StagedTask};
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::{SimpleFileOptions, ZipWriter};

pub fn backup_task() -> StagedTask {
    StagedTask::new("Backup sources").stage(Stage::new(
        "Backing up sources",
        1,
        FnStage::new(|ctx| backup_sources(ctx).map(|_| ())),
    ))
}

fn backup_sources(ctx: &StageContext<'_>) -> Result<PathBuf> {
    let workspace = ctx.session.workspace();
    let sources = workspace.sources();
    anyhow::ensure!(sources.is_dir(), "no sources to back up in {:?}", sources);

    let files: Vec<PathBuf> = WalkDir::new(&sources)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    let backups = workspace.backups();
    fs::create_dir_all(&backups)?;
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let archive = backups.join(format!("src-{}.zip", timestamp));
    write_archive(&archive, &sources, &files, |done| {
        ctx.report((done * 100 / files.len().max(1)) as u8);
    })?;

    info!("Backed up {} file(s) to {:?}", files.len(), archive);
    Ok(archive)
}

fn write_archive(archive: &Path, root: &Path, files: &[PathBuf], mut on_file: impl FnMut(usize)) -> Result<()> {
    let out = fs::File::create(archive).with_context(|| format!("creating {:?}", archive))?;
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (i, path) in files.iter().enumerate() {
        let name = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(path)?)?;
        on_file(i + 1);
    }
    zip.finish()?;
    Ok(())
}
