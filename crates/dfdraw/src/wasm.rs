//! WebAssembly bindings
//!
//! [`DfdCanvas`] wraps a [`Workspace`] and a mounted [`SceneHandle`] so a
//! browser host can forward pointer events and read back SVG markup. Errors
//! become JavaScript exceptions.

use wasm_bindgen::prelude::*;

use crate::core::{ElementPatch, Graph, Point};
use crate::scene::{export, SceneConfig, SceneHandle};
use crate::session::Workspace;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Sets up the panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

/// Render a graph JSON document to standalone SVG
#[wasm_bindgen]
pub fn render_svg(json: &str) -> Result<String, JsValue> {
    crate::render_svg(json).map_err(js_error)
}

/// Interactive diagram canvas
#[wasm_bindgen]
pub struct DfdCanvas {
    workspace: Workspace,
    scene: SceneHandle,
}

#[wasm_bindgen]
impl DfdCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new() -> DfdCanvas {
        DfdCanvas {
            workspace: Workspace::new(),
            scene: SceneHandle::mount(SceneConfig::default()),
        }
    }

    fn refresh(&mut self) {
        self.workspace.render(&mut self.scene);
    }

    /// Replace the graph with a JSON document
    pub fn load(&mut self, json: &str) -> Result<(), JsValue> {
        let graph = Graph::from_json(json).map_err(js_error)?;
        self.workspace.set_graph(graph);
        self.refresh();
        Ok(())
    }

    /// Current graph as JSON
    pub fn save(&self) -> Result<String, JsValue> {
        self.workspace.export_json().map_err(js_error)
    }

    #[wasm_bindgen(js_name = toggleEditMode)]
    pub fn toggle_edit_mode(&mut self) -> bool {
        let on = self.workspace.toggle_edit_mode();
        self.refresh();
        on
    }

    #[wasm_bindgen(js_name = addEntity)]
    pub fn add_entity(&mut self) -> String {
        let id = self.workspace.add_entity();
        self.refresh();
        id
    }

    #[wasm_bindgen(js_name = addProcess)]
    pub fn add_process(&mut self) -> String {
        let id = self.workspace.add_process();
        self.refresh();
        id
    }

    #[wasm_bindgen(js_name = addStore)]
    pub fn add_store(&mut self) -> String {
        let id = self.workspace.add_store();
        self.refresh();
        id
    }

    #[wasm_bindgen(js_name = addFlow)]
    pub fn add_flow(&mut self) -> Result<String, JsValue> {
        let id = self.workspace.add_flow().map_err(js_error)?;
        self.refresh();
        Ok(id)
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&mut self) -> bool {
        let deleted = self.workspace.delete_selected();
        self.refresh();
        deleted
    }

    /// Apply an inspector edit given as a JSON patch object
    #[wasm_bindgen(js_name = updateSelected)]
    pub fn update_selected(&mut self, patch: &str) -> Result<bool, JsValue> {
        let patch: ElementPatch = serde_json::from_str(patch).map_err(js_error)?;
        let updated = self.workspace.update_selected(&patch);
        self.refresh();
        Ok(updated)
    }

    /// Selected element as JSON, or `null`
    pub fn selected(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.workspace.selected()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.scene.pointer_down(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.scene.pointer_move(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.scene.pointer_up(Point::new(x, y), &mut self.workspace);
        self.refresh();
    }

    /// Returns true when an element was selected
    pub fn click(&mut self, x: f64, y: f64) -> bool {
        self.scene
            .click(Point::new(x, y), &mut self.workspace)
            .is_some()
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> f64 {
        self.scene.wheel(Point::new(x, y), delta_y)
    }

    #[wasm_bindgen(js_name = zoomLabel)]
    pub fn zoom_label(&self) -> String {
        self.scene.zoom_label()
    }

    /// Viewport markup with the current zoom and pan applied
    pub fn svg(&self, width: f64, height: f64) -> Result<String, JsValue> {
        export::to_live_svg(&self.scene, width, height).map_err(js_error)
    }

    #[wasm_bindgen(js_name = exportSvg)]
    pub fn export_svg(&self) -> Result<String, JsValue> {
        export::to_svg(&self.scene).map_err(js_error)
    }

    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        export::to_png(&self.scene, self.scene.config().raster_scale).map_err(js_error)
    }

    /// Transcript as JSON
    pub fn messages(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.workspace.messages()).map_err(js_error)
    }
}

impl Default for DfdCanvas {
    fn default() -> Self {
        Self::new()
    }
}
