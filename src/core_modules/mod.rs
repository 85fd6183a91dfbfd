pub mod annotator;
pub mod color_filter;
pub mod color_space;
pub mod contour;
pub mod hsv_range;
pub mod moment;
pub mod morphology;
pub mod object_selector;
