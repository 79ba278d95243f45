//! Replays the interactive tooltips page against an in-memory document:
//! a list whose items are appended and removed while a watching manager
//! keeps up, a draggable target, and a second manager driven by focus.

use std::error::Error;
use std::fs::File;
use std::rc::Rc;

use log::{debug, info};
use simplelog::{Config, LevelFilter, WriteLogger};
use tipdom::{Document, Element, Event, NodeId};
use tooltips::{
    FnFactory, Tooltip, TooltipOptions, Tooltips, TooltipsConfig, standard_defaults,
};

/// Stand-in widget that narrates instead of drawing.
struct Balloon {
    content: String,
    options: TooltipOptions,
    anchor: Option<NodeId>,
    visible: bool,
}

impl Balloon {
    fn describe(&self) -> String {
        let anchor = self.anchor.map(|a| a.to_string()).unwrap_or_default();
        let place = self.options.get("place").unwrap_or("top");
        match self.options.get("effectClass") {
            Some(effect) if !effect.is_empty() => {
                format!("\"{}\" on {anchor} ({place}, {effect})", self.content)
            }
            _ => format!("\"{}\" on {anchor} ({place})", self.content),
        }
    }
}

impl Tooltip<NodeId> for Balloon {
    fn show(&mut self) {
        self.visible = true;
        println!("  show    {}", self.describe());
    }

    fn hide(&mut self) {
        self.visible = false;
        println!("  hide    {}", self.describe());
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn destroy(&mut self) {
        self.visible = false;
        println!("  destroy {}", self.describe());
    }

    fn reposition(&mut self) {
        debug!("reposition {}", self.describe());
    }

    fn attach(&mut self, anchor: NodeId) {
        self.anchor = Some(anchor);
    }
}

fn balloons() -> FnFactory<impl Fn(&str, TooltipOptions) -> Box<dyn Tooltip<NodeId>>> {
    FnFactory::new(standard_defaults(), |content: &str, options: TooltipOptions| {
        Box::new(Balloon {
            content: content.to_string(),
            options,
            anchor: None,
            visible: false,
        }) as Box<dyn Tooltip<NodeId>>
    })
}

fn page(doc: &Document) -> Result<(), Box<dyn Error>> {
    doc.append(
        doc.root(),
        Element::div()
            .id("main")
            .child(Element::item().id("top").data("tip", "Placed on top"))
            .child(
                Element::item()
                    .id("right")
                    .data("tip", "Placed right")
                    .data("tipPlace", "right"),
            )
            .child(
                Element::item()
                    .id("movable")
                    .data("tip", "Drag me around")
                    .data("tipAuto", "1"),
            ),
    )?;

    doc.append(
        doc.root(),
        Element::div()
            .id("dynamic")
            .child(Element::new("button").id("add").data("action", "add").text("Add"))
            .child(
                Element::new("button")
                    .id("remove")
                    .data("action", "remove")
                    .text("Remove"),
            )
            .child(
                Element::list()
                    .id("targets")
                    .child(Element::item().data("tip", "Existing tip").text("old")),
            ),
    )?;

    doc.append(
        doc.root(),
        Element::div()
            .id("focusable")
            .child(Element::new("input").id("name").data("ftip", "Your full name"))
            .child(
                Element::new("input")
                    .id("email")
                    .data("ftip", "We never share it")
                    .data("ftipPlace", "bottom"),
            ),
    )?;
    Ok(())
}

/// Delegated click handling for the add/remove buttons of the dynamic list.
fn wire_buttons(doc: &Document) -> Result<(), Box<dyn Error>> {
    let (Some(dynamic), Some(targets)) = (doc.find_by_id("dynamic"), doc.find_by_id("targets"))
    else {
        return Err("dynamic list missing".into());
    };

    let host = doc.clone();
    doc.add_listener(
        dynamic,
        "click",
        Rc::new(move |event: &Event| {
            let result = match host.data(event.target, "action").as_deref() {
                Some("add") => host
                    .append(
                        targets,
                        Element::item().data("tip", "A new tip appeared!").text("new"),
                    )
                    .map(|_| ()),
                Some("remove") => match host.children(targets).last() {
                    Some(last) => host.remove(*last).map(|_| ()),
                    None => Ok(()),
                },
                _ => Ok(()),
            };
            if let Err(err) = result {
                info!("button click failed: {err}");
            }
        }),
    )?;
    Ok(())
}

fn find(doc: &Document, id: &str) -> Result<NodeId, Box<dyn Error>> {
    doc.find_by_id(id)
        .ok_or_else(|| format!("no element with id '{id}'").into())
}

fn main() -> Result<(), Box<dyn Error>> {
    let log_file = File::create("tooltips-demo.log")?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;

    let doc = Document::new();
    page(&doc)?;
    wire_buttons(&doc)?;

    let tips = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new()
            .key("tip")
            .observe(true)
            .widget_defaults(
                standard_defaults()
                    .with("effectClass", "slide")
                    .with("auto", "1"),
            ),
        balloons(),
    )?;
    let ftips = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new()
            .key("ftip")
            .show_on("focus")
            .hide_on("blur")
            .widget_defaults(standard_defaults().with("place", "right")),
        balloons(),
    )?;
    info!("{tips:?}");
    info!("{ftips:?}");

    println!("hovering static targets");
    for id in ["top", "right"] {
        let node = find(&doc, id)?;
        doc.dispatch(node, "mouseenter");
        doc.dispatch(node, "mouseleave");
    }

    println!("dragging the movable target");
    let movable = find(&doc, "movable")?;
    doc.dispatch(movable, "mouseenter");
    if let Some(tip) = tips.get(movable)? {
        for _ in 0..3 {
            tip.reposition();
        }
    }
    doc.dispatch(movable, "mouseleave");

    println!("adding two items to the dynamic list");
    let add = find(&doc, "add")?;
    doc.dispatch(add, "click");
    doc.dispatch(add, "click");
    let targets = find(&doc, "targets")?;
    println!("  {} tooltip target(s) bound", tips.len()?);

    if let Some(newest) = doc.children(targets).last().copied() {
        doc.dispatch(newest, "mouseenter");
    }

    println!("removing the newest item while its tooltip is open");
    doc.dispatch(find(&doc, "remove")?, "click");
    println!("  {} tooltip target(s) bound", tips.len()?);

    println!("tabbing through the form");
    for id in ["name", "email"] {
        let node = find(&doc, id)?;
        doc.dispatch(node, "focus");
        doc.dispatch(node, "mouseenter");
        doc.dispatch(node, "blur");
    }

    println!("tearing down");
    tips.destroy()?;
    ftips.destroy()?;

    Ok(())
}
