use serde_json::{Map, Value};

const DEFAULT_TEXT: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, \
sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim \
veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo \
consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum \
dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non proident, \
sunt in culpa qui officia deserunt mollit anim id est laborum";

/// The presentation options document with its startup defaults.
///
/// This is the typed seed for the shared store; at runtime the store keeps the
/// document as a JSON object so that fields outside this schema are stored
/// verbatim when clients send them.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsDocument {
    pub text: String,
    /// Scroll rate in display units per tick.
    pub speed: f64,
    pub font: String,
    pub font_size: f64,
    pub font_color: String,
    pub background_color: String,
    pub mirrored: bool,
    pub reversed: bool,
    pub playing: bool,
    /// Scroll progress, 0-100.
    pub percent: f64,
}

impl Default for OptionsDocument {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            speed: 0.1,
            font: "Arial".to_string(),
            font_size: 48.0,
            font_color: "white".to_string(),
            background_color: "black".to_string(),
            mirrored: false,
            reversed: false,
            playing: false,
            percent: 0.0,
        }
    }
}

impl OptionsDocument {
    /// Flattens the document into the JSON object shape it travels as on the
    /// wire (camelCase keys).
    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("text".into(), Value::from(self.text.clone()));
        object.insert("speed".into(), Value::from(self.speed));
        object.insert("font".into(), Value::from(self.font.clone()));
        object.insert("fontSize".into(), Value::from(self.font_size));
        object.insert("fontColor".into(), Value::from(self.font_color.clone()));
        object.insert(
            "backgroundColor".into(),
            Value::from(self.background_color.clone()),
        );
        object.insert("mirrored".into(), Value::from(self.mirrored));
        object.insert("reversed".into(), Value::from(self.reversed));
        object.insert("playing".into(), Value::from(self.playing));
        object.insert("percent".into(), Value::from(self.percent));
        object
    }
}
