//! Scene configuration

use crate::core::NodeKind;

/// Layout and interaction constants for a scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// X of the first process/store placeholder column
    pub start_x: f64,
    /// Horizontal distance between placeholder columns
    pub column_pitch: f64,
    /// Y of the process placeholder row
    pub center_y: f64,
    /// Vertical distance from the process row to the entity and store rows
    pub row_offset: f64,
    /// Entity placeholder x, relative to `start_x`
    pub entity_offset_x: f64,
    pub entity_height: f64,
    pub process_height: f64,
    pub store_height: f64,
    pub entity_min_width: f64,
    pub process_min_width: f64,
    pub store_min_width: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Flow labels sit this far above the midpoint of the two centers
    pub label_offset: f64,
    /// Screen-space distance within which a click hits a flow path
    pub hit_tolerance: f64,
    /// Padding around the content bounds in exported images
    pub export_padding: f64,
    /// Pixel density of raster exports
    pub raster_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            start_x: 300.0,
            column_pitch: 450.0,
            center_y: 600.0,
            row_offset: 250.0,
            entity_offset_x: -200.0,
            entity_height: 60.0,
            process_height: 80.0,
            store_height: 50.0,
            entity_min_width: 160.0,
            process_min_width: 180.0,
            store_min_width: 180.0,
            min_scale: 0.1,
            max_scale: 4.0,
            label_offset: 12.0,
            hit_tolerance: 6.0,
            export_padding: 60.0,
            raster_scale: 2.0,
        }
    }
}

impl SceneConfig {
    pub fn node_height(&self, kind: NodeKind) -> f64 {
        match kind {
            NodeKind::Entity => self.entity_height,
            NodeKind::Process => self.process_height,
            NodeKind::Store => self.store_height,
        }
    }

    pub fn min_width(&self, kind: NodeKind) -> f64 {
        match kind {
            NodeKind::Entity => self.entity_min_width,
            NodeKind::Process => self.process_min_width,
            NodeKind::Store => self.store_min_width,
        }
    }

    pub fn clamp_scale(&self, k: f64) -> f64 {
        k.clamp(self.min_scale, self.max_scale)
    }
}
