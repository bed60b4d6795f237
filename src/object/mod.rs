//! Various PDF objects.

use pdf_writer::{Chunk, Ref};

use crate::serialize::{ChunkContainer, SerializeContext};
use crate::util::SipHashable;

pub(crate) mod cid_font;
pub(crate) mod ext_g_state;
#[cfg(feature = "raster-images")]
pub mod image;

pub(crate) type ChunkContainerFn = fn(&mut ChunkContainer) -> &mut Vec<Chunk>;

/// An object that is written at most once per document, no matter how often
/// it is used. Identity is determined by its hash.
pub(crate) trait Cacheable: SipHashable {
    fn chunk_container(&self) -> ChunkContainerFn;
    fn serialize(self, sc: &mut SerializeContext, root_ref: Ref) -> Chunk;
}
