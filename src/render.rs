use crate::config::MapConfig;
use crate::types::{Dataset, District, PowerStatus};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::{MultiPolygon, Point};
use tracing::debug;

/// The two element groups the renderer manages on a surface. Groups are
/// cleared and toggled as a whole, never element by element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerGroup {
    Regions,
    Labels,
}

/// Visual class a status maps to. Exactly three classes exist; the mapping
/// is total, so unknown statuses always land somewhere (neutral).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualClass {
    Alert,
    Normal,
    Neutral,
}

pub fn visual_class(status: &PowerStatus) -> VisualClass {
    match status {
        PowerStatus::Outage => VisualClass::Alert,
        PowerStatus::Powered => VisualClass::Normal,
        _ => VisualClass::Neutral,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionStyle {
    pub color: String,
    pub weight: f64,
    pub fill_opacity: f64,
}

/// Popup content for one region, with placeholders already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub district: String,
    pub population: String,
    pub status: String,
    pub outage_start: String,
    pub outage_end: String,
}

impl Popup {
    pub fn for_district(district: &District) -> Self {
        Popup {
            district: district.name.clone(),
            population: district
                .population_estimate
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            status: match &district.status {
                PowerStatus::Unset => "Unknown".to_string(),
                other => other.to_string(),
            },
            outage_start: placeholder_if_blank(district.outage_start.as_deref()),
            outage_end: placeholder_if_blank(district.outage_end.as_deref()),
        }
    }
}

fn placeholder_if_blank(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Display surface the renderer draws onto. The actual map engine
/// (tiles, projection, widget toolkit) lives behind this trait; the core
/// only adds and removes elements and reacts to its notifications.
///
/// Regions are added with their district key so the surface can report
/// "edit requested" interactions as structured [`SurfaceEvent`]s instead
/// of locating a globally named callback.
pub trait MapSurface {
    fn add_region(
        &mut self,
        district: &str,
        geometry: &MultiPolygon<f64>,
        style: RegionStyle,
        popup: Popup,
    );

    fn add_label(&mut self, district: &str, position: Point<f64>, text: &str);

    fn clear_group(&mut self, group: LayerGroup);

    fn set_group_visible(&mut self, group: LayerGroup, visible: bool);

    /// Position for a region's label. The default places it at the center
    /// of the bounding shape; `None` means the geometry has no extent and
    /// the label is skipped.
    fn centroid_of(&self, geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
        geometry.bounding_rect().map(|rect| {
            let c = rect.center();
            Point::new(c.x, c.y)
        })
    }
}

/// Notifications a surface delivers back to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The operator activated a region's edit trigger.
    EditRequested(String),
    /// The zoom/detail level changed (e.g. the map was zoomed).
    DetailLevelChanged(u8),
}

/// Regenerates the map visuals from a dataset snapshot.
///
/// Every render is a full redraw: clear both groups, then add one styled
/// region and one centroid label per district. Fine at tens of districts;
/// a keyed diff against the previous snapshot would be the upgrade path
/// for much larger datasets.
#[derive(Debug, Clone)]
pub struct MapRenderer {
    config: MapConfig,
}

impl MapRenderer {
    pub fn new(config: MapConfig) -> Self {
        MapRenderer { config }
    }

    /// Styling is a pure function of status, total over all values.
    pub fn style_for(&self, status: &PowerStatus) -> RegionStyle {
        let color = match visual_class(status) {
            VisualClass::Alert => self.config.alert_color.clone(),
            VisualClass::Normal => self.config.normal_color.clone(),
            VisualClass::Neutral => self.config.neutral_color.clone(),
        };
        RegionStyle {
            color,
            weight: self.config.weight,
            fill_opacity: self.config.fill_opacity,
        }
    }

    pub fn render<S: MapSurface>(&self, dataset: &Dataset, surface: &mut S) {
        surface.clear_group(LayerGroup::Regions);
        surface.clear_group(LayerGroup::Labels);

        for district in &dataset.districts {
            surface.add_region(
                &district.name,
                &district.geometry,
                self.style_for(&district.status),
                Popup::for_district(district),
            );

            match surface.centroid_of(&district.geometry) {
                Some(position) => surface.add_label(&district.name, position, &district.name),
                None => debug!(district = %district.name, "no label position, geometry has no extent"),
            }
        }
    }

    /// Toggles the label group against the configured detail threshold.
    /// One collection-level operation, regardless of label count.
    pub fn apply_detail_level<S: MapSurface>(&self, level: u8, surface: &mut S) {
        let visible = level >= self.config.label_zoom_threshold;
        surface.set_group_visible(LayerGroup::Labels, visible);
    }
}

/// In-memory surface: records exactly what a real map engine would be
/// asked to draw. Backs the `inspect` command and the test suite.
#[derive(Debug)]
pub struct MemorySurface {
    pub regions: Vec<RegionElement>,
    pub labels: Vec<LabelElement>,
    pub labels_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionElement {
    pub district: String,
    pub style: RegionStyle,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelElement {
    pub district: String,
    pub position: Point<f64>,
    pub text: String,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        MemorySurface {
            regions: Vec::new(),
            labels: Vec::new(),
            labels_visible: true,
        }
    }

    pub fn region(&self, district: &str) -> Option<&RegionElement> {
        self.regions.iter().find(|r| r.district == district)
    }
}

impl MapSurface for MemorySurface {
    fn add_region(
        &mut self,
        district: &str,
        _geometry: &MultiPolygon<f64>,
        style: RegionStyle,
        popup: Popup,
    ) {
        self.regions.push(RegionElement {
            district: district.to_string(),
            style,
            popup,
        });
    }

    fn add_label(&mut self, district: &str, position: Point<f64>, text: &str) {
        self.labels.push(LabelElement {
            district: district.to_string(),
            position,
            text: text.to_string(),
        });
    }

    fn clear_group(&mut self, group: LayerGroup) {
        match group {
            LayerGroup::Regions => self.regions.clear(),
            LayerGroup::Labels => self.labels.clear(),
        }
    }

    fn set_group_visible(&mut self, group: LayerGroup, visible: bool) {
        if group == LayerGroup::Labels {
            self.labels_visible = visible;
        }
    }
}
