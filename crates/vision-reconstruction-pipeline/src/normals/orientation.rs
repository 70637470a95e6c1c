//! Sign disambiguation of fitted plane normals.
//!
//! A fitted plane has no preferred side. The normal is turned to face the
//! reference point `T` of an observing calibrated shot: with
//! `signed = n · T − d`, a negative value means `T` lies behind the normal
//! and the normal is flipped. Vertices without a calibrated observer keep
//! the fitted sign.
//!
//! `T` is the shot's reference point in world coordinates, not a camera
//! translation vector, so the flip test is `n · T − d < 0` rather than `> 0`.

use serde::{Deserialize, Serialize};
use vision_reconstruction_core::{
    IncidenceEntry, Plane, ReconstructionStore, ShotId, Vec3,
};

/// How the reference view is chosen from a vertex's incidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationPolicy {
    /// First calibrated shot in incidence order.
    #[default]
    FirstCalibrated,
    /// Side chosen by most distinct calibrated observers; ties fall back to
    /// [`FirstCalibrated`](Self::FirstCalibrated).
    MajorityVote,
}

/// A unit normal with its resolved sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedNormal {
    pub normal: Vec3,
    /// Whether the fitted normal was negated.
    pub flipped: bool,
    /// First calibrated observer, `None` if the vertex has none.
    pub reference: Option<ShotId>,
}

/// Whether the normal of `plane` must be negated to face `t`.
#[inline]
pub fn faces_away(plane: &Plane, t: &Vec3) -> bool {
    plane.signed_distance(t) < 0.0
}

fn calibrated_observers<'a>(
    incidence: &'a [IncidenceEntry],
    store: &'a ReconstructionStore,
) -> impl Iterator<Item = (ShotId, Vec3)> + 'a {
    incidence.iter().filter_map(move |entry| {
        store
            .shot(entry.shot)
            .filter(|shot| shot.calibrated)
            .map(|shot| (entry.shot, shot.t))
    })
}

/// Orient the normal of `plane` using the observers in `incidence`.
///
/// Returns `None` if the plane's normal cannot be normalized.
pub fn resolve_orientation(
    plane: &Plane,
    incidence: &[IncidenceEntry],
    store: &ReconstructionStore,
    policy: OrientationPolicy,
) -> Option<OrientedNormal> {
    let [a, b, c, d] = plane.coefficients();
    let plane = Plane::from_coefficients(a, b, c, d)?;

    let Some((reference, t)) = calibrated_observers(incidence, store).next() else {
        return Some(OrientedNormal {
            normal: plane.normal,
            flipped: false,
            reference: None,
        });
    };

    let flip = match policy {
        OrientationPolicy::FirstCalibrated => faces_away(&plane, &t),
        OrientationPolicy::MajorityVote => {
            let mut seen: Vec<ShotId> = Vec::new();
            let (mut keep, mut away) = (0usize, 0usize);
            for (shot, t) in calibrated_observers(incidence, store) {
                if seen.contains(&shot) {
                    continue;
                }
                seen.push(shot);
                let signed = plane.signed_distance(&t);
                if signed > 0.0 {
                    keep += 1;
                } else if signed < 0.0 {
                    away += 1;
                }
            }
            match away.cmp(&keep) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => faces_away(&plane, &t),
            }
        }
    };

    Some(OrientedNormal {
        normal: if flip { -plane.normal } else { plane.normal },
        flipped: flip,
        reference: Some(reference),
    })
}
