pub(crate) mod cel;
pub(crate) mod image;
pub(crate) mod layer;
pub(crate) mod selected_layers;
pub(crate) mod sprite;
