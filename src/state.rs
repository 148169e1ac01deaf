use crossterm::event::KeyCode;
use rand::Rng;
use std::time::Instant;

use crate::{
    config::Config,
    error::Result,
    observations::ObservationSet,
    parks::ParkCatalog,
    quakes::{Quake, load_quakes},
    view::{DisplayMode, ViewController},
};

pub struct AppState {
    pub observations: ObservationSet,
    pub catalog: ParkCatalog,
    pub quakes: Vec<Quake>,
    pub view: ViewController,
    pub list_items: Vec<String>,
    pub selected: usize,
    pub status: Option<String>,
}

impl AppState {
    const HELP_TEXT: &'static str = "\
↑/↓: move in list
Enter: show charts
Esc / Backspace: close charts
←/→: focus a status
+/-: zoom, w/a/s/d: pan
p: pause pings
q: quit";

    /// Loads every input named in `config`. The earthquake feed is optional.
    pub fn load(config: &Config) -> Result<Self> {
        let data = &config.data;
        let observations = ObservationSet::load(data.resolve(&data.observations))?;
        let catalog = ParkCatalog::load(data.resolve(&data.parks), data.resolve(&data.polygons))?;
        let quakes = match &data.earthquakes {
            Some(path) => load_quakes(data.resolve(path)).unwrap_or_else(|e| {
                log::warn!("Earthquake feed unavailable: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        let view = ViewController::new(config.map.clone(), config.chart.clone(), config.pings.clone());
        Ok(Self::new(observations, catalog, quakes, view))
    }

    pub fn new(observations: ObservationSet, catalog: ParkCatalog, quakes: Vec<Quake>, view: ViewController) -> Self {
        let list_items = catalog.names();
        Self {
            observations,
            catalog,
            quakes,
            view,
            list_items,
            selected: 0,
            status: None,
        }
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.list_items.get(self.selected).map(String::as_str)
    }

    pub fn info_text(&self) -> String {
        let mut text = format!(
            "{} parks, {} observations, {} earthquakes\n",
            self.list_items.len(),
            self.observations.len(),
            self.quakes.len()
        );
        if let Some(ping) = self.view.pings().latest() {
            let mag = ping.mag.map_or("M ?".to_string(), |m| format!("M {:.1}", m));
            text.push_str(&format!("Latest quake: {} at {:.2}, {:.2}\n", mag, ping.lat, ping.lon));
        }
        if let Some(popup) = self.view.popup() {
            let agg = &popup.charts.aggregate;
            text.push_str(&format!(
                "\n{}\n{} species in {} categories\n",
                agg.park,
                agg.total(),
                agg.category_counts.len()
            ));
        }
        if let Some(status) = &self.status {
            text.push_str(&format!("\n{}\n", status));
        }
        text.push('\n');
        text.push_str(Self::HELP_TEXT);
        text
    }

    fn open_selected(&mut self) {
        let Some(name) = self.list_items.get(self.selected).cloned() else {
            return;
        };
        let boundaries = self.view.mode() == DisplayMode::Polygons;
        let feature = self.catalog.feature(&name, boundaries);
        if let Some((lon, lat)) = feature.and_then(|f| f.anchor()) {
            self.view.center_on(lon, lat);
        }
        // the picked shape names the park the charts are built for
        let name = feature.map(|f| f.park_name().to_string()).unwrap_or(name);
        self.status = match self.view.select(&self.observations, &name) {
            Ok(popup) if popup.charts.aggregate.is_empty() => Some(format!("No observations for {}", name)),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Cannot open {}: {}", name, e);
                Some(e.to_string())
            }
        };
    }

    pub fn tick<R: Rng>(&mut self, now: Instant, rng: &mut R) {
        self.view.tick(now, &self.quakes, rng);
    }

    /// Returns true when the app should quit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            Down => {
                if self.selected + 1 < self.list_items.len() {
                    self.selected += 1;
                }
            }
            Enter => self.open_selected(),
            Backspace | Esc => {
                self.view.close_popup();
                self.status = None;
            }
            Left | Right => {
                if let Some(popup) = self.view.popup_mut() {
                    popup.cycle_focus(key == Right);
                }
            }
            Char('+') | Char('=') => self.view.zoom_in(),
            Char('-') => self.view.zoom_out(),
            Char('w') => self.view.pan(0.0, 1.0),
            Char('s') => self.view.pan(0.0, -1.0),
            Char('a') => self.view.pan(-1.0, 0.0),
            Char('d') => self.view.pan(1.0, 0.0),
            Char('p') => self.view.toggle_pings(),
            _ => {}
        }
        false
    }
}
