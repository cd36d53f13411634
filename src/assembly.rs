//! Static (in-place) and modal job descriptions
//!
//! Both builders are pure: they take the run entities and return a [`Deck`].
//! Writing the deck and running the solver is left to the pipeline.

use crate::config::ModalSettings;
use crate::deck::{sci, sci_width, Card, Deck};
use crate::error::{PipelineError, PipelineResult};
use crate::geometry::Model;
use crate::results::NODE_FILE;
use crate::seabed::{contact_nodes, segment_added_mass, Gap, Seabed};
use crate::section::Pipe;

/// Element and node set of the static pipeline
pub const STATIC_SET: &str = "PIPELINE";
/// Element and node set of the modal pipeline
pub const MODAL_SET: &str = "PIPE";
const MATERIAL: &str = "STEEL";
const SEABED_SURFACE: &str = "SEABED";
const SEABED_REF: &str = "SEABED_REF";
/// Horizontal extension of the analytic seabed beyond both pipe ends, in m
const SEABED_OVERHANG: f64 = 10.0;

const SPRING_SETS: [(&str, usize); 3] = [("SPR_AX", 1), ("SPR_VERT", 2), ("SPR_LAT", 3)];

fn pinned_ends(last_node: usize) -> Vec<String> {
    vec![
        "1, 1, 1, 0".to_string(),
        "1, 6, 6, 0".to_string(),
        format!("{}, 1, 1, 0", last_node),
        format!("{}, 6, 6, 0", last_node),
    ]
}

fn field_output(deck: &mut Deck) {
    deck.push(Card::new("OUTPUT").flag("FIELD").param("VARIABLE", "PRESELECT"));
    deck.push(
        Card::new("ELEMENT OUTPUT")
            .param("ELSET", STATIC_SET)
            .param("VARIABLE", "PRESELECT")
            .line(["ESF1", "SF", "SE", "S"]),
    );
    deck.push(
        Card::new("NODE OUTPUT")
            .param("NSET", STATIC_SET)
            .param("VARIABLE", "PRESELECT"),
    );
}

/// In-place model: pinned pipe settling onto an analytic seabed under
/// self-weight, then pressurised and heated.
pub fn static_deck(model: &Model, pipe: &Pipe, seabed: &Seabed) -> PipelineResult<Deck> {
    model.validate()?;

    let profile = model.seabed_profile();
    let (first, last) = model.extent();
    let elements = model.element_count();
    let last_node = elements + 1;
    let mut deck = Deck::new();

    // geometry and section
    deck.push(
        Card::new("NODE")
            .param("NSET", STATIC_SET)
            .line([format!("1, {}, 0", first)])
            .line([format!("{}, {}, 0", last_node, last)]),
    );
    deck.push(
        Card::new("NGEN")
            .param("NSET", STATIC_SET)
            .line([1, last_node, 1]),
    );
    deck.push(
        Card::new("ELEMENT")
            .param("TYPE", "PIPE21H")
            .param("ELSET", STATIC_SET)
            .line([1, 1, 2]),
    );
    deck.push(Card::new("ELGEN").param("ELSET", STATIC_SET).line([1, elements]));
    deck.push(
        Card::new("BEAM SECTION")
            .param("ELSET", STATIC_SET)
            .param("SECTION", "THICK PIPE")
            .param("MATERIAL", MATERIAL)
            .line([pipe.od, pipe.wt]),
    );

    // material
    deck.push(Card::new("MATERIAL").param("NAME", MATERIAL));
    deck.push(
        Card::new("ELASTIC")
            .param("TYPE", "ISOTROPIC")
            .line([sci(pipe.e, 3), pipe.nu.to_string()]),
    );
    deck.push(Card::new("EXPANSION").param("TYPE", "ISO").line([sci(pipe.alpha, 3)]));
    deck.push(Card::new("DENSITY").line([sci(pipe.effective_density(), 3)]));
    deck.push(
        Card::new("BOUNDARY")
            .param("TYPE", "DISPLACEMENT")
            .lines(pinned_ends(last_node)),
    );

    // seabed contact
    deck.push(
        Card::new("SURFACE")
            .param("NAME", STATIC_SET)
            .param("TYPE", "ELEMENT")
            .line([STATIC_SET]),
    );
    deck.push(
        Card::new("NODE")
            .param("NSET", SEABED_REF)
            .line([format!("{}, {}, 0", last_node + 1, first - SEABED_OVERHANG)]),
    );

    let mut surface = Card::new("SURFACE")
        .param("TYPE", "SEGMENTS")
        .param("NAME", SEABED_SURFACE)
        .line([format!("START, {}, {}", first - SEABED_OVERHANG, profile[0][1])]);
    for p in &profile {
        surface = surface.line([format!("LINE, {}, {}", p[0], p[1])]);
    }
    let end_elevation = profile[profile.len() - 1][1];
    surface = surface.line([format!("LINE, {}, {}", last + SEABED_OVERHANG, end_elevation)]);
    deck.push(surface);

    deck.push(Card::new("SURFACE INTERACTION").param("NAME", SEABED_SURFACE));
    deck.push(
        Card::new("SURFACE BEHAVIOR")
            .param("PRESSURE-OVERCLOSURE", "LINEAR")
            .line([sci(seabed.k_vert_sta, 3)]),
    );
    deck.push(Card::new("FRICTION").line([sci(seabed.mu_ax, 3)]));
    deck.push(
        Card::new("RIGID BODY")
            .param("ANALYTICAL SURFACE", SEABED_SURFACE)
            .param("REF NODE", SEABED_REF),
    );
    deck.push(
        Card::new("CONTACT PAIR")
            .param("INTERACTION", SEABED_SURFACE)
            .param("TYPE", "NODE TO SURFACE")
            .line([STATIC_SET, SEABED_SURFACE]),
    );

    // stage 1: self-weight
    deck.push(Card::new("STEP").param("NLGEOM", "YES"));
    deck.push(Card::new("STATIC").line(["0.1", "1", "1E-10", "1"]));
    let mut fixed = pinned_ends(last_node);
    fixed.push(format!("{}, 1, 2, 0", SEABED_REF));
    fixed.push(format!("{}, 6, 6, 0", SEABED_REF));
    deck.push(
        Card::new("BOUNDARY")
            .param("OP", "NEW")
            .flag("FIXED")
            .lines(fixed),
    );
    deck.push(
        Card::new("DLOAD")
            .param("OP", "NEW")
            .line([STATIC_SET.to_string(), "GRAV".to_string(), model.g.to_string(), "0".to_string(), "-1".to_string()]),
    );
    field_output(&mut deck);
    deck.push(Card::new("END STEP"));

    // stage 2: operating pressure and temperature
    deck.push(Card::new("STEP").param("NLGEOM", "YES"));
    deck.push(Card::new("STATIC").line(["0.1", "1", "1E-10", "1"]));
    deck.push(
        Card::new("DLOAD")
            .param("OP", "MOD")
            .line([STATIC_SET.to_string(), "PI".to_string(), sci(pipe.pi, 3), sci(pipe.inner_diameter(), 3)]),
    );
    deck.push(Card::new("TEMPERATURE").line([STATIC_SET.to_string(), sci(pipe.t, 3)]));
    field_output(&mut deck);
    deck.push(Card::new("END STEP"));

    tracing::debug!("Static deck: {} nodes, {} elements", last_node, elements);
    Ok(deck)
}

fn check_gaps(model: &Model, gaps: &[Gap]) -> PipelineResult<()> {
    let expected = model.node_count();
    if gaps.len() != expected {
        return Err(PipelineError::inconsistent(format!(
            "{} gaps for a static model of {} nodes",
            gaps.len(),
            expected
        )));
    }
    if let Some((i, g)) = gaps.iter().enumerate().find(|(i, g)| g.node != i + 1) {
        return Err(PipelineError::inconsistent(format!(
            "gap entry {} belongs to node {}, expected node {}",
            i + 1,
            g.node,
            i + 1
        )));
    }
    Ok(())
}

/// Modal model on the deformed static configuration with seabed springs at
/// contact nodes and gap-dependent added mass.
pub fn modal_deck(
    model: &Model,
    pipe: &Pipe,
    seabed: &Seabed,
    gaps: &[Gap],
    settings: &ModalSettings,
) -> PipelineResult<Deck> {
    model.validate()?;
    check_gaps(model, gaps)?;

    let nodes = gaps.len();
    let contacts = contact_nodes(gaps);
    let springs = seabed.contact_springs(pipe, model);
    let mut deck = Deck::new();

    deck.push(Card::new("INCLUDE").param("INPUT", NODE_FILE));
    deck.push(
        Card::new("ELEMENT")
            .param("ELSET", MODAL_SET)
            .param("TYPE", "PIPE31H")
            .line([1, 1, 2]),
    );
    deck.push(Card::new("ELGEN").param("ELSET", MODAL_SET).line([1, nodes - 1, 1, 1]));
    deck.push(
        Card::new("BEAM SECTION")
            .param("SECT", "PIPE")
            .param("ELSET", MODAL_SET)
            .param("MATERIAL", MATERIAL)
            .line([pipe.od, pipe.wt]),
    );
    deck.push(Card::new("MATERIAL").param("NAME", MATERIAL));
    deck.push(Card::new("ELASTIC").line([sci(pipe.e, 3), pipe.nu.to_string()]));
    deck.push(Card::new("DENSITY").line([sci(pipe.effective_density(), 3)]));

    if contacts.is_empty() {
        tracing::warn!("No node rests on the seabed; modal model has no soil springs");
    } else {
        let stiffness = [springs.axial, springs.vertical, springs.lateral];
        for (set, (name, _)) in SPRING_SETS.iter().enumerate() {
            let first_id = nodes + set * contacts.len();
            let lines = contacts
                .iter()
                .enumerate()
                .map(|(n, node)| format!("{}, {}", first_id + n, node));
            deck.push(
                Card::new("ELEMENT")
                    .param("TYPE", "SPRING1")
                    .param("ELSET", name)
                    .lines(lines),
            );
        }
        for ((name, dof), k) in SPRING_SETS.iter().zip(stiffness) {
            deck.push(
                Card::new("SPRING")
                    .param("ELSET", name)
                    .line([dof])
                    .line([sci_width(k, 9, 3)]),
            );
        }
    }

    deck.push(Card::new("AQUA").line([
        format!("-{}", model.water_depth),
        "0.".to_string(),
        model.g.to_string(),
        model.rho_sw.to_string(),
    ]));
    deck.push(
        Card::new("INITIAL CONDITIONS")
            .param("TYPE", "STRESS")
            .line([MODAL_SET.to_string(), sci(pipe.effective_axial_stress(), 3)]),
    );

    // stage 1: re-equilibrate on springs
    deck.push(
        Card::new("STEP")
            .param("INC", 100)
            .flag("NLGEOM")
            .line(["INITIAL SET UP"]),
    );
    deck.push(Card::new("STATIC").line(["0.0001", "1.0", "1.0E-9"]));
    deck.push(Card::new("CONTROLS").param("ANALYSIS", "DISCONTINUOUS"));
    deck.push(
        Card::new("BOUNDARY")
            .param("OP", "NEW")
            .line(["1, 1, 6".to_string()])
            .line([format!("{}, 2, 3", nodes)])
            .line([format!("{}, 1, 3", MODAL_SET)]),
    );
    deck.push(
        Card::new("OUTPUT")
            .flag("FIELD")
            .param("FREQ", 10)
            .param("VARIABLE", "PRESELECT"),
    );
    deck.push(
        Card::new("ELEMENT OUTPUT")
            .param("ELSET", MODAL_SET)
            .line(["SF", "SE", "ESF1", "TEMP"]),
    );
    deck.push(Card::new("NODE OUTPUT").param("NSET", MODAL_SET).line(["U", "COORD"]));
    deck.push(
        Card::new("OUTPUT")
            .flag("HISTORY")
            .param("FREQ", 0)
            .param("VARIABLE", "PRESELECT"),
    );
    deck.push(Card::new("END STEP"));

    // stage 2: eigenvalue extraction
    deck.push(
        Card::new("STEP")
            .flag("NLGEOM")
            .param("UNSYMM", "YES")
            .param("INC", 2000)
            .line(["FREQUENCY EXTRACTION"]),
    );
    deck.push(
        Card::new("FREQUENCY")
            .param("EIGENSOLVER", "LANCZOS")
            .line([settings.num_modes]),
    );
    deck.push(
        Card::new("BOUNDARY")
            .param("OP", "NEW")
            .line(["1, 1, 6".to_string()])
            .line([format!("{}, 2, 3", nodes)])
            .line([format!("{}, 4, 4", MODAL_SET)]),
    );
    let added_mass = segment_added_mass(gaps, pipe.od)
        .into_iter()
        .enumerate()
        .map(|(i, ca)| format!("{}, FI, {}, {}", i + 1, pipe.od, ca));
    deck.push(Card::new("D ADDED MASS").lines(added_mass));
    deck.push(
        Card::new("NODE PRINT")
            .param("GLOBAL", "YES")
            .param("NSET", MODAL_SET)
            .param("FREQ", 999)
            .line(["U,".to_string()]),
    );
    deck.push(
        Card::new("OUTPUT")
            .flag("FIELD")
            .param("VARIABLE", "ALL")
            .param("FREQUENCY", 999),
    );
    deck.push(Card::new("MODAL FILE"));
    deck.push(Card::new("END STEP"));

    tracing::info!(
        "Modal deck: {} nodes, {} in contact, springs ax={:.3e} vert={:.3e} lat={:.3e}",
        nodes,
        contacts.len(),
        springs.axial,
        springs.vertical,
        springs.lateral
    );
    Ok(deck)
}
