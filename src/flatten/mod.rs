pub(crate) mod layers;
pub(crate) mod merge_down;
pub(crate) mod visibility;
