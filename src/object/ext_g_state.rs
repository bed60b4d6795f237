//! External graphics states.

use std::sync::Arc;

use pdf_writer::{Chunk, Finish, Ref};

use crate::object::{Cacheable, ChunkContainerFn};
use crate::serialize::SerializeContext;

/// The inner representation of an external graphics state.
#[derive(Debug, Hash, PartialEq, Eq, Default, Clone)]
struct Repr {
    /// The non-stroking alpha, in 1/255 steps.
    non_stroking_alpha: Option<u8>,
    /// The stroking alpha, in 1/255 steps.
    stroking_alpha: Option<u8>,
}

/// A graphics state carrying the current stroking and non-stroking alpha.
///
/// This type is cheap to clone.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Default)]
pub(crate) struct ExtGState(Arc<Repr>);

impl ExtGState {
    /// Create a new, empty graphics state.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create a new graphics state with a stroking alpha.
    #[must_use]
    pub(crate) fn stroking_alpha(mut self, stroking_alpha: u8) -> Self {
        Arc::make_mut(&mut self.0).stroking_alpha = Some(stroking_alpha);
        self
    }

    /// Create a new graphics state with a non-stroking alpha.
    #[must_use]
    pub(crate) fn non_stroking_alpha(mut self, non_stroking_alpha: u8) -> Self {
        Arc::make_mut(&mut self.0).non_stroking_alpha = Some(non_stroking_alpha);
        self
    }

    /// A graphics state that sets both alphas to the same value.
    ///
    /// Paint operators only ever see the alpha of the color that was set
    /// last, so both alphas always follow it.
    pub(crate) fn alpha(alpha: u8) -> Self {
        Self::new().stroking_alpha(alpha).non_stroking_alpha(alpha)
    }
}

impl Cacheable for ExtGState {
    fn chunk_container(&self) -> ChunkContainerFn {
        |cc| &mut cc.ext_g_states
    }

    fn serialize(self, _: &mut SerializeContext, root_ref: Ref) -> Chunk {
        let mut chunk = Chunk::new();

        let mut ext_st = chunk.ext_graphics(root_ref);
        if let Some(nsa) = self.0.non_stroking_alpha {
            ext_st.non_stroking_alpha(nsa as f32 / 255.0);
        }

        if let Some(sa) = self.0.stroking_alpha {
            ext_st.stroking_alpha(sa as f32 / 255.0);
        }

        ext_st.finish();

        chunk
    }
}
