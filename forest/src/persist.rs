//! Reading and writing fitted forests.
//!
//! The artifact is the JSON encoding of a [`RandomForest`]. It carries no
//! version or checksum; a model is only ever read back by the same build
//! that wrote it.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use log::info;

use crate::{RandomForest, Result};

/// Writes `model` to `writer`.
pub fn write<W: Write>(model: &RandomForest, writer: W) -> Result<()> {
    serde_json::to_writer(writer, model)?;
    Ok(())
}

/// Reads a forest from `reader` and checks it is well formed.
pub fn read<R: Read>(reader: R) -> Result<RandomForest> {
    let model: RandomForest = serde_json::from_reader(reader)?;
    model.validate()?;
    Ok(model)
}

/// Writes `model` to the file at `path`, replacing it if it exists.
///
/// The write is not atomic: a failure part way leaves a truncated file.
pub fn save<P: AsRef<Path>>(model: &RandomForest, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write(model, &mut writer)?;
    writer.flush()?;

    info!("saved {} trees to {}", model.trees().len(), path.display());
    Ok(())
}

/// Loads a forest from the file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RandomForest> {
    let path = path.as_ref();
    let model = read(BufReader::new(File::open(path)?))?;

    info!("loaded {} trees from {}", model.trees().len(), path.display());
    Ok(model)
}
