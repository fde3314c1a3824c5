pub mod access;
pub mod align;
pub mod convert;
pub mod formatize;
pub mod merge;
pub mod normalize;
pub mod registry;
pub mod shorten;
pub mod template;
pub mod translate;
pub mod walk;

pub use access::{delete, get, get_mut, get_optional, lookup_any, set};
pub use align::{AlignError, MatchMatrix, align, build_match_matrix, scalar_paths};
pub use convert::convert;
pub use formatize::{SUFFIX_SEPARATOR, formatize, formatize_default, split_suffix};
pub use merge::{add, subtract};
pub use normalize::{Normalizer, normalize};
pub use registry::{MemoryTermRegistry, StaticConceptResolver};
pub use shorten::PrefixShortener;
pub use template::{metaplate, template};
pub use translate::translate;
pub use walk::{Visit, visit_nodes, walk};
