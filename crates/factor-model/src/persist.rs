//! JSON persistence for baseline models.

use crate::error::Result;
use crate::model::LatentFactorModel;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

impl LatentFactorModel {
    /// Load a model written by [`LatentFactorModel::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: LatentFactorModel = serde_json::from_reader(reader)?;
        model.validate_dimensions()?;
        let (users, items) = model.counts();
        info!(
            "Loaded model from {:?}: {} users, {} items, k={}",
            path, users, items, model.n_factors
        );
        Ok(model)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        info!("Saved model to {:?}", path);
        Ok(())
    }
}
