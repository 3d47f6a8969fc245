use outage_map::config::{MapConfig, PropertyKeys};
use outage_map::render::{MapRenderer, MemorySurface, SurfaceEvent};
use outage_map::store::DistrictStore;
use outage_map::types::PowerStatus;
use outage_map::workflow::{EditForm, EditState, FormEvent, FormValues, UpdateWorkflow};

const DOCUMENT: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"NAME_2": "A", "PopEst": 12000},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}
        },
        {
            "type": "Feature",
            "properties": {"NAME_2": "B", "Status": "powered", "PopEst": 34000},
            "geometry": {"type": "Polygon", "coordinates": [[[3,0],[5,0],[5,2],[3,2],[3,0]]]}
        }
    ]
}"#;

#[derive(Default)]
struct ModalForm {
    visible: bool,
    prefill: Option<FormValues>,
}

impl EditForm for ModalForm {
    fn show(&mut self, prefill: FormValues) {
        self.visible = true;
        self.prefill = Some(prefill);
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

fn workflow() -> UpdateWorkflow<MemorySurface, ModalForm> {
    UpdateWorkflow::new(
        DistrictStore::new(PropertyKeys::default()),
        MapRenderer::new(MapConfig::default()),
        MemorySurface::new(),
        ModalForm::default(),
    )
}

#[test]
fn load_edit_redraw_cycle() {
    let mut wf = workflow();
    wf.load_document(DOCUMENT.as_bytes()).unwrap();

    // Initial draw: two regions, two labels, A neutral, B normal.
    assert_eq!(wf.surface().regions.len(), 2);
    assert_eq!(wf.surface().labels.len(), 2);
    assert_eq!(wf.surface().region("A").unwrap().style.color, "gray");
    assert_eq!(wf.surface().region("B").unwrap().style.color, "green");

    let b_before = wf.surface().region("B").unwrap().clone();

    // Operator clicks A's edit trigger, then submits an outage window.
    wf.handle_surface_event(SurfaceEvent::EditRequested("A".to_string()));
    assert_eq!(
        wf.state(),
        &EditState::Editing {
            district: "A".to_string()
        }
    );
    assert!(wf.form().visible);
    assert_eq!(wf.form().prefill.as_ref().unwrap().district, "A");
    assert_eq!(
        wf.form().prefill.as_ref().unwrap().status,
        PowerStatus::Unset
    );
    wf.handle_form_event(FormEvent::Submitted(FormValues {
        district: "A".to_string(),
        status: PowerStatus::Outage,
        outage_start: "2024-01-01T00:00".to_string(),
        outage_end: "2024-01-01T06:00".to_string(),
    }));

    // Post-render: A is alert-styled with both timestamps in the popup.
    assert_eq!(wf.state(), &EditState::Idle);
    let a = wf.surface().region("A").unwrap();
    assert_eq!(a.style.color, "red");
    assert_eq!(a.popup.status, "outage");
    assert_eq!(a.popup.outage_start, "2024-01-01T00:00");
    assert_eq!(a.popup.outage_end, "2024-01-01T06:00");

    // B is unchanged in style and content.
    assert_eq!(wf.surface().region("B").unwrap(), &b_before);
    assert_eq!(wf.surface().regions.len(), 2);
    assert_eq!(wf.surface().labels.len(), 2);
}

#[test]
fn label_gating_leaves_regions_alone() {
    let mut wf = workflow();
    wf.load_document(DOCUMENT.as_bytes()).unwrap();

    wf.handle_surface_event(SurfaceEvent::DetailLevelChanged(6));
    assert!(!wf.surface().labels_visible);

    wf.handle_surface_event(SurfaceEvent::DetailLevelChanged(8));
    assert!(wf.surface().labels_visible);

    assert_eq!(wf.surface().regions.len(), 2);
    assert_eq!(wf.surface().region("A").unwrap().style.color, "gray");
    assert_eq!(wf.surface().region("B").unwrap().style.color, "green");
}

#[test]
fn cancelled_edit_keeps_the_map_as_is() {
    let mut wf = workflow();
    wf.load_document(DOCUMENT.as_bytes()).unwrap();

    wf.handle_surface_event(SurfaceEvent::EditRequested("B".to_string()));
    assert_eq!(
        wf.form().prefill.as_ref().unwrap().status,
        PowerStatus::Powered
    );
    wf.handle_form_event(FormEvent::Cancelled);

    assert_eq!(wf.state(), &EditState::Idle);
    assert!(!wf.form().visible);
    assert_eq!(
        wf.store().current().unwrap().find("B").unwrap().status,
        PowerStatus::Powered
    );
    assert_eq!(wf.surface().region("B").unwrap().style.color, "green");
}
