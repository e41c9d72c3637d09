//! Color value resolution.
//!
//! [`ColorValueResolver`] answers which color values an output carries for a
//! requested set of colors. It relies on two collaborators: the blockchain
//! state provider for the output's confirmation height, and the scan engine
//! which must cover the requested colors up to that height before the cache
//! is read.

use crate::color_data::ColorDataStore;
use crate::types::{BlockHeight, ColorId, ColorValue, OutputRef};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Confirmation status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxConfirmation {
    /// Height of the confirming block, `None` while unconfirmed
    pub height: Option<BlockHeight>,
    /// Whether the transaction sits in the memory pool
    pub in_mempool: bool,
}

impl TxConfirmation {
    pub fn confirmed(height: BlockHeight) -> Self {
        Self {
            height: Some(height),
            in_mempool: false,
        }
    }

    pub fn pending() -> Self {
        Self {
            height: None,
            in_mempool: true,
        }
    }

    /// Neither confirmed nor pending
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Supplies confirmation data for transactions.
#[cfg_attr(test, mockall::automock)]
pub trait BlockchainState: Send + Sync {
    fn get_tx_block_height(&self, txhash: &str) -> Result<TxConfirmation>;
}

/// Scan engine extending color value coverage.
#[cfg_attr(test, mockall::automock)]
pub trait ColorDataBuilder: Send + Sync {
    /// Blocks until the cache holds every value of `color_ids` up to `height`.
    fn ensure_scanned_upto(&self, color_ids: &BTreeSet<ColorId>, height: BlockHeight) -> Result<()>;
}

impl<T: BlockchainState + ?Sized> BlockchainState for Arc<T> {
    fn get_tx_block_height(&self, txhash: &str) -> Result<TxConfirmation> {
        (**self).get_tx_block_height(txhash)
    }
}

impl<T: ColorDataBuilder + ?Sized> ColorDataBuilder for Arc<T> {
    fn ensure_scanned_upto(&self, color_ids: &BTreeSet<ColorId>, height: BlockHeight) -> Result<()> {
        (**self).ensure_scanned_upto(color_ids, height)
    }
}

/// Serves color values from the cache once coverage is guaranteed.
pub struct ColorValueResolver<B, S> {
    builder: S,
    blockchain_state: B,
    cdstore: ColorDataStore,
}

impl<B: BlockchainState, S: ColorDataBuilder> ColorValueResolver<B, S> {
    pub fn new(builder: S, blockchain_state: B, cdstore: ColorDataStore) -> Self {
        Self {
            builder,
            blockchain_state,
            cdstore,
        }
    }

    /// Returns the values of `output` for the colors in `color_ids`.
    ///
    /// Fails with [`Error::NotFinal`] when the output's transaction is not in
    /// a block. Requested colors without a cached row are left out of the
    /// result. Collaborator errors are returned unchanged.
    pub fn get_colorvalues(
        &self,
        color_ids: &BTreeSet<ColorId>,
        output: &OutputRef,
    ) -> Result<Vec<(ColorId, ColorValue)>> {
        let confirmation = self.blockchain_state.get_tx_block_height(&output.txhash)?;
        let Some(height) = confirmation.height else {
            return Err(Error::NotFinal {
                txhash: output.txhash.clone(),
            });
        };

        debug!(target: "colorcoin", %output, height, colors = color_ids.len(), "resolving color values");
        // Coverage must be complete before the read, or absent rows lose meaning
        self.builder.ensure_scanned_upto(color_ids, height)?;

        let values = self
            .cdstore
            .get_all_for_output(output)?
            .into_iter()
            .filter(|(color_id, _)| color_ids.contains(color_id))
            .collect();
        Ok(values)
    }

    pub fn color_data_store(&self) -> &ColorDataStore {
        &self.cdstore
    }
}
