//! Renderer boundary
//!
//! The engine never draws anything itself. It hands a `&mut dyn Renderer`
//! to every visible object's draw hook, in depth order, and the hook
//! downcasts it to whatever backend it was written for.

use crate::ecs::AsAny;

/// Opaque draw capability supplied by the rendering backend
pub trait Renderer: AsAny + 'static {
    /// Called before a layer's draw pass
    fn begin_layer(&mut self, _layer: &str) {}

    /// Called after a layer's draw pass
    fn end_layer(&mut self, _layer: &str) {}
}

impl dyn Renderer {
    /// Downcast to the concrete backend
    pub fn downcast_mut<R: Renderer>(&mut self) -> Option<&mut R> {
        self.as_any_mut().downcast_mut::<R>()
    }
}

/// Renderer that ignores everything
///
/// Handed to hooks outside of draw passes and useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Journal {
        layers: Vec<String>,
    }

    impl Renderer for Journal {
        fn begin_layer(&mut self, layer: &str) {
            self.layers.push(layer.to_string());
        }
    }

    #[test]
    fn test_downcast_to_backend() {
        let mut journal = Journal::default();
        let renderer: &mut dyn Renderer = &mut journal;
        renderer.begin_layer("hud");

        assert!(renderer.downcast_mut::<NullRenderer>().is_none());
        let journal = renderer.downcast_mut::<Journal>().unwrap();
        assert_eq!(journal.layers, vec!["hud".to_string()]);
    }
}
