use serde::Serialize;
use serde_json::Value;

use crate::scene::SceneDescription;

pub const SCENE_FORMAT: &str = "vectorlift.scene";
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// Translates an engine-neutral scene into one renderer's input format.
pub trait SceneAdapter {
    type Output;
    type Error: std::error::Error;

    fn adapt(&self, scene: &SceneDescription) -> Result<Self::Output, Self::Error>;
}

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'static str,
    version: u32,
    scene: &'a SceneDescription,
}

/// Bundled adapter: the scene as a versioned JSON document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonSceneAdapter {
    pub pretty: bool,
}

impl JsonSceneAdapter {
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn to_value(&self, scene: &SceneDescription) -> Result<Value, serde_json::Error> {
        serde_json::to_value(envelope(scene))
    }
}

fn envelope(scene: &SceneDescription) -> Envelope<'_> {
    Envelope {
        format: SCENE_FORMAT,
        version: SCENE_FORMAT_VERSION,
        scene,
    }
}

impl SceneAdapter for JsonSceneAdapter {
    type Output = String;
    type Error = serde_json::Error;

    fn adapt(&self, scene: &SceneDescription) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(&envelope(scene))
        } else {
            serde_json::to_string(&envelope(scene))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConvertOptions;
    use crate::scene::compose;

    #[test]
    fn json_envelope_carries_format_and_scene_sections() {
        let scene = compose(Vec::new(), Vec::new(), &ConvertOptions::default());
        let value = JsonSceneAdapter::compact().to_value(&scene).unwrap();
        assert_eq!(value["format"], SCENE_FORMAT);
        assert_eq!(value["version"], 1);
        let body = &value["scene"];
        for key in ["bounds", "camera", "lights", "objects", "materials", "groups"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["camera"]["projection"]["type"], "orthographic");
        assert_eq!(body["lights"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn pretty_and_compact_encode_the_same_value() {
        let scene = compose(Vec::new(), Vec::new(), &ConvertOptions::default());
        let compact: Value =
            serde_json::from_str(&JsonSceneAdapter::compact().adapt(&scene).unwrap()).unwrap();
        let pretty: Value =
            serde_json::from_str(&JsonSceneAdapter::pretty().adapt(&scene).unwrap()).unwrap();
        assert_eq!(compact, pretty);
    }
}
