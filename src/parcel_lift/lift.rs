use super::{bulk_rich, ParcelResult};
use crate::{
    config::{LiftConfig, SaturationConfig},
    error::{soft, AnalysisError, Result},
    interpolation::{
        agl_from_msl, dewpoint_for_pressure, height_for_pressure, msl_from_agl,
        pressure_for_height, temperature_for_pressure, virtual_temperature_for_pressure,
    },
    levels::temperature_level,
    parcel::Parcel,
    sounding::Sounding,
    thermo::{self, G, ZEROCNK},
    utility::all_valid,
};
use itertools::izip;
use log::{debug, warn};
use metfor::{Celsius, CelsiusDiff, HectoPascal, JpKg, Meters, Quantity};
use optional::{some, Optioned};

pub(super) fn lift_parcel(
    snd: &Sounding,
    parcel: &Parcel,
    lower: Option<HectoPascal>,
    upper: Option<HectoPascal>,
    cfg: &LiftConfig,
) -> Result<ParcelResult> {
    let mut result = ParcelResult::missing(*parcel);

    let (p0, t0, td0) = (parcel.pressure, parcel.temperature, parcel.dew_point);
    if !all_valid(&[p0.unpack(), t0.unpack(), td0.unpack()]) {
        warn!("parcel is missing data, nothing to lift");
        return Ok(result);
    }
    if parcel.is_supersaturated() {
        warn!(
            "parcel dew point {:?} is above its temperature {:?}, nothing to lift",
            td0, t0
        );
        return Ok(result);
    }

    let usable_levels = izip!(snd.pressure_profile(), snd.temperature_profile())
        .filter(|(p, t)| p.is_some() && t.is_some())
        .count();
    if usable_levels < 2 {
        warn!("not enough levels to lift a parcel: {}", usable_levels);
        return Ok(result);
    }

    let (sfc_p, top_p) = match (
        snd.surface_pressure().into_option(),
        snd.top_pressure().into_option(),
    ) {
        (Some(sfc_p), Some(top_p)) => (sfc_p, top_p),
        _ => {
            warn!("sounding has no surface or top pressure");
            return Ok(result);
        }
    };

    let lower = lower.unwrap_or(sfc_p);
    let lower = if lower > p0 { p0 } else { lower };
    let upper = upper.unwrap_or(top_p);

    if soft(virtual_temperature_for_pressure(snd, lower))?.is_none()
        || soft(virtual_temperature_for_pressure(snd, upper))?.is_none()
    {
        warn!(
            "no virtual temperature at the layer bounds {:?} - {:?}",
            lower, upper
        );
        return Ok(result);
    }
    result.lower = some(lower);
    result.upper = some(upper);

    let (p_lcl, t_lcl) = match soft(thermo::dry_lift(p0, t0, td0))? {
        Some(lcl) => lcl,
        None => {
            warn!("unable to find the LCL");
            return Ok(result);
        }
    };
    result.lcl_pressure = some(p_lcl);
    result.lcl_temperature = some(t_lcl);
    let lcl_agl = soft(height_agl(snd, p_lcl))?;
    result.lcl_height = lcl_agl.into();

    let bl_cin = match soft(boundary_layer_cin(snd, parcel, lower, p_lcl, cfg))? {
        Some(cin) => cin,
        None => {
            debug!("unable to integrate CIN below the LCL");
            0.0
        }
    };

    let start = height_for_pressure(snd, p_lcl)
        .and_then(|h| Ok((h, virtual_temperature_for_pressure(snd, p_lcl)?)))
        .and_then(|(h, env_vt)| Point::new(p_lcl, h, env_vt, t_lcl));

    let result = match start {
        Ok(start) => {
            let mut ascent = Ascent::new(snd, cfg, upper, start, bl_cin, lcl_agl)?;

            let levels = izip!(
                snd.pressure_profile(),
                snd.height_profile(),
                snd.temperature_profile(),
                snd.dew_point_profile()
            )
            .filter(|(p, _, t, _)| p.is_some() && t.is_some())
            .map(|(p, h, t, td)| (p.unpack(), h.into_option(), t.unpack(), td.into_option()))
            .filter(|&(p, _, _, _)| p < p_lcl);

            for (p, h, t, td) in levels {
                let h = match h {
                    Some(h) => h,
                    None => match soft(height_for_pressure(snd, p))? {
                        Some(h) => h,
                        None => continue,
                    },
                };

                let next = match soft(ascent.next_point(p, h, t, td))? {
                    Some(next) => next,
                    None => continue,
                };

                ascent.advance(next)?;
            }

            ascent.finish(result)?
        }
        Err(AnalysisError::OutOfRange) => {
            debug!("LCL at {:?} is outside the sounding", p_lcl);
            result.cape = some(JpKg(0.0));
            result.cin = some(JpKg(0.0));
            result
        }
        Err(err) if err.is_soft() => {
            warn!("no environment data at the LCL {:?}: {}", p_lcl, err);
            result.lower = optional::none();
            result.upper = optional::none();
            return Ok(result);
        }
        Err(err) => return Err(err),
    };

    finish_brn(snd, result)
}

fn finish_brn(snd: &Sounding, mut result: ParcelResult) -> Result<ParcelResult> {
    if let Some(cape) = result.cape.into_option() {
        if let Some((shear, brn)) = soft(bulk_rich(snd, &result.parcel, cape))? {
            result.brn_shear = some(shear);
            result.brn = brn;
        }
    }

    debug!(
        "{}: lifted {} parcel: LCL {:?}, LFC {:?}, EL {:?}, CAPE {:?}, CIN {:?}",
        snd.station_info(),
        result.parcel.flag,
        result.lcl_pressure.into_option(),
        result.lfc_pressure.into_option(),
        result.el_pressure.into_option(),
        result.cape.into_option(),
        result.cin.into_option(),
    );

    Ok(result)
}

/// Negative energy between the bottom of the layer and the LCL.
///
/// The parcel keeps its potential temperature and mixing ratio below the LCL, so the buoyancy is
/// found by comparing virtual potential temperatures.
fn boundary_layer_cin(
    snd: &Sounding,
    parcel: &Parcel,
    lower: HectoPascal,
    p_lcl: HectoPascal,
    cfg: &LiftConfig,
) -> Result<f64> {
    if !(lower > p_lcl) {
        return Ok(0.0);
    }

    let pcl_theta = parcel.theta()?;
    let pcl_mw = parcel.mixing_ratio()?;

    let buoyancy = |p: HectoPascal| -> Result<(Meters, f64)> {
        let h = height_for_pressure(snd, p)?;

        let pcl_td = thermo::temperature_at_mixing_ratio(pcl_mw, p)?;
        let pcl_vt = thermo::virtual_temperature(p, pcl_theta, pcl_td)?;

        let env_theta = thermo::theta(p, temperature_for_pressure(snd, p)?, HectoPascal(1000.0))?;
        let env_td = dewpoint_for_pressure(snd, p).ok();
        let env_vt = thermo::virtual_temperature(p, env_theta, env_td)?;

        Ok((h, (pcl_vt - env_vt).unpack() / (env_vt.unpack() + ZEROCNK)))
    };

    let mut p1 = lower;
    let (mut h1, mut tdef1) = buoyancy(p1)?;
    let mut cin = 0.0;

    for _ in 0..cfg.max_search_steps {
        if p1 <= p_lcl {
            return Ok(cin);
        }

        let p2 = if p1 - cfg.cin_step > p_lcl {
            p1 - cfg.cin_step
        } else {
            p_lcl
        };
        let (h2, tdef2) = buoyancy(p2)?;

        let lyre = G * (tdef1 + tdef2) / 2.0 * (h2 - h1).unpack();
        if lyre < 0.0 {
            cin += lyre;
        }

        p1 = p2;
        h1 = h2;
        tdef1 = tdef2;
    }

    warn!("boundary layer CIN gave up at {:?}", p1);
    Err(AnalysisError::Convergence {
        routine: "boundary_layer_cin",
        iterations: cfg.max_search_steps,
    })
}

fn height_agl(snd: &Sounding, p: HectoPascal) -> Result<Meters> {
    height_for_pressure(snd, p).and_then(|h| agl_from_msl(snd, h))
}

/// The parcel and environment at one level of the moist ascent.
#[derive(Debug, Clone, Copy)]
struct Point {
    p: HectoPascal,
    h: Meters,
    env_vt: Celsius,
    pcl_t: Celsius,
    pcl_vt: Celsius,
}

impl Point {
    fn new(p: HectoPascal, h: Meters, env_vt: Celsius, pcl_t: Celsius) -> Result<Self> {
        let pcl_vt = thermo::virtual_temperature(p, pcl_t, pcl_t)?;

        Ok(Point {
            p,
            h,
            env_vt,
            pcl_t,
            pcl_vt,
        })
    }

    /// Lift the parcel from this point to `p`, interpolating the environment there.
    fn lift_to(&self, snd: &Sounding, p: HectoPascal, sat: &SaturationConfig) -> Result<Self> {
        let h = height_for_pressure(snd, p)?;
        let env_vt = virtual_temperature_for_pressure(snd, p)?;
        let pcl_t = thermo::wet_lift_with(self.p, self.pcl_t, p, sat)?;

        Point::new(p, h, env_vt, pcl_t)
    }

    fn buoyancy(&self) -> f64 {
        (self.pcl_vt - self.env_vt).unpack() / (self.env_vt.unpack() + ZEROCNK)
    }
}

/// Buoyant energy (J/kg) of the layer between two points.
fn layer_energy(bottom: &Point, top: &Point) -> f64 {
    G * (bottom.buoyancy() + top.buoyancy()) / 2.0 * (top.h - bottom.h).unpack()
}

/// Pressure levels where partial CAPE values are cut off.
#[derive(Debug, Default)]
struct Targets {
    freezing: Option<HectoPascal>,
    m10c: Option<HectoPascal>,
    m20c: Option<HectoPascal>,
    m30c: Option<HectoPascal>,
    h3km: Option<HectoPascal>,
    h6km: Option<HectoPascal>,
}

impl Targets {
    fn new(snd: &Sounding) -> Result<Self> {
        let isotherm = |t: f64| soft(temperature_level(snd, Celsius(t)));
        let agl = |h: f64| {
            soft(msl_from_agl(snd, Meters(h)).and_then(|h| pressure_for_height(snd, h)))
        };

        Ok(Targets {
            freezing: isotherm(0.0)?,
            m10c: isotherm(-10.0)?,
            m20c: isotherm(-20.0)?,
            m30c: isotherm(-30.0)?,
            h3km: agl(3000.0)?,
            h6km: agl(6000.0)?,
        })
    }
}

/// Values captured the first time the ascent crosses a level.
#[derive(Debug, Default)]
struct Captures {
    // CAPE and CIN inside the layer
    layer: Option<(f64, f64)>,
    cape_freezing: Option<f64>,
    cape_m10c: Option<f64>,
    cape_m20c: Option<f64>,
    cape_m30c: Option<f64>,
    cape_3km: Option<f64>,
    cape_6km: Option<f64>,
    li5: Option<f64>,
    li3: Option<f64>,
    lfc: Option<HectoPascal>,
    cin_at_lfc: Option<f64>,
    cap: Option<(f64, HectoPascal)>,
    el: Option<HectoPascal>,
    li_max: Option<(f64, HectoPascal)>,
    mpl: Option<HectoPascal>,
}

/// Running totals of buoyant energy.
#[derive(Debug, Default)]
struct Totals {
    positive: f64,
    negative: f64,
    // Net energy since the most recent LFC.
    since_lfc: f64,
    last_layer: f64,
}

/// The state of a moist ascent, level by level from the LCL.
struct Ascent<'a> {
    snd: &'a Sounding,
    cfg: &'a LiftConfig,
    upper: HectoPascal,
    targets: Targets,
    prev: Point,
    totals: Totals,
    found: Captures,
    // Largest parcel minus environment virtual temperature so far.
    max_buoyancy: Option<(f64, HectoPascal)>,
    // Largest environment minus parcel virtual temperature so far.
    max_deficit: Option<(f64, HectoPascal)>,
}

impl<'a> Ascent<'a> {
    fn new(
        snd: &'a Sounding,
        cfg: &'a LiftConfig,
        upper: HectoPascal,
        start: Point,
        bl_cin: f64,
        lcl_agl: Option<Meters>,
    ) -> Result<Self> {
        let mut found = Captures::default();
        if let Some(lcl_agl) = lcl_agl {
            if lcl_agl >= Meters(3000.0) {
                found.cape_3km = Some(0.0);
            }
            if lcl_agl >= Meters(6000.0) {
                found.cape_6km = Some(0.0);
            }
        }

        Ok(Ascent {
            snd,
            cfg,
            upper,
            targets: Targets::new(snd)?,
            prev: start,
            totals: Totals {
                negative: bl_cin,
                ..Totals::default()
            },
            found,
            max_buoyancy: None,
            max_deficit: None,
        })
    }

    fn next_point(
        &self,
        p: HectoPascal,
        h: Meters,
        t: Celsius,
        td: Option<Celsius>,
    ) -> Result<Point> {
        let env_vt = thermo::virtual_temperature(p, t, td)?;
        let pcl_t = thermo::wet_lift_with(self.prev.p, self.prev.pcl_t, p, &self.cfg.saturation)?;

        Point::new(p, h, env_vt, pcl_t)
    }

    fn advance(&mut self, next: Point) -> Result<()> {
        let lyre = layer_energy(&self.prev, &next);
        let last = self.totals.last_layer;

        self.totals.last_layer = lyre;
        if lyre > 0.0 {
            self.totals.positive += lyre;
        } else if next.p > self.cfg.cin_pressure_floor {
            self.totals.negative += lyre;
        }
        self.totals.since_lfc += lyre;

        let diff = (next.pcl_vt - next.env_vt).unpack();
        if self.max_buoyancy.map(|(b, _)| diff > b).unwrap_or(true) {
            self.max_buoyancy = Some((diff, next.p));
        }
        if self.max_deficit.map(|(d, _)| -diff > d).unwrap_or(true) {
            self.max_deficit = Some((-diff, next.p));
        }

        self.close_layer(&next, lyre)?;
        self.partial_capes(&next, lyre)?;
        self.lfc_and_el(&next, lyre, last)?;
        self.mpl(lyre)?;
        self.lifted_indexes(&next)?;

        self.prev = next;
        Ok(())
    }

    /// Energy between the previous level and `target`, if `target` is in the layer ending at `next`.
    fn partial_energy(&self, next: &Point, target: Option<HectoPascal>) -> Result<Option<f64>> {
        match target {
            Some(tgt) if tgt <= self.prev.p && tgt >= next.p => {
                let top = soft(self.prev.lift_to(self.snd, tgt, &self.cfg.saturation))?;
                Ok(top.map(|top| layer_energy(&self.prev, &top)))
            }
            _ => Ok(None),
        }
    }

    /// Positive energy from the LCL up to `target`.
    fn energy_below(&self, next: &Point, lyre: f64, target: Option<HectoPascal>) -> Result<f64> {
        let partial = self.partial_energy(next, target)?.unwrap_or(0.0);
        Ok(self.totals.positive - lyre.max(0.0) + partial.max(0.0))
    }

    /// Fill `slot` with the positive energy below `target` the first time the ascent reaches it.
    fn capture(
        &self,
        slot: Option<f64>,
        next: &Point,
        lyre: f64,
        target: Option<HectoPascal>,
    ) -> Result<Option<f64>> {
        let reached = target.map(|tgt| next.p <= tgt).unwrap_or(false);
        if slot.is_some() || !reached {
            return Ok(slot);
        }
        self.energy_below(next, lyre, target).map(Some)
    }

    fn close_layer(&mut self, next: &Point, lyre: f64) -> Result<()> {
        if self.found.layer.is_some() || next.p > self.upper {
            return Ok(());
        }

        let floor = self.cfg.cin_pressure_floor;
        let partial = self.partial_energy(next, Some(self.upper))?.unwrap_or(0.0);

        let positive = self.totals.positive - lyre.max(0.0) + partial.max(0.0);

        let mut negative = self.totals.negative;
        if lyre < 0.0 && next.p > floor {
            negative -= lyre;
        }
        if partial < 0.0 && self.upper > floor {
            negative += partial;
        }

        self.found.layer = Some((positive, negative));
        Ok(())
    }

    fn partial_capes(&mut self, next: &Point, lyre: f64) -> Result<()> {
        let tgts = &self.targets;

        self.found.cape_freezing =
            self.capture(self.found.cape_freezing, next, lyre, tgts.freezing)?;
        self.found.cape_m10c = self.capture(self.found.cape_m10c, next, lyre, tgts.m10c)?;
        self.found.cape_m20c = self.capture(self.found.cape_m20c, next, lyre, tgts.m20c)?;
        self.found.cape_m30c = self.capture(self.found.cape_m30c, next, lyre, tgts.m30c)?;
        self.found.cape_3km = self.capture(self.found.cape_3km, next, lyre, tgts.h3km)?;
        self.found.cape_6km = self.capture(self.found.cape_6km, next, lyre, tgts.h6km)?;

        Ok(())
    }

    fn lfc_and_el(&mut self, next: &Point, lyre: f64, last: f64) -> Result<()> {
        if lyre > 0.0 && last <= 0.0 {
            if let Some(lfc) = self.refine(next, |env_vt, pcl_vt| env_vt > pcl_vt)? {
                self.found.lfc = Some(lfc);
                self.found.cin_at_lfc = Some(self.totals.negative);
                self.found.cap = self.max_deficit.map(|(d, p)| (d.max(0.0), p));
                self.found.el = None;
                self.found.mpl = None;
                self.totals.since_lfc = 0.0;
            }
        }

        if lyre <= 0.0 && last > 0.0 && self.found.lfc.is_some() {
            if let Some(el) = self.refine(next, |env_vt, pcl_vt| env_vt < pcl_vt)? {
                self.found.el = Some(el);
                self.found.li_max = self.max_buoyancy.map(|(b, p)| (-b, p));
            }
        }

        Ok(())
    }

    /// Step up from the previous level while `keep_going` holds for the environment and parcel
    /// virtual temperatures, stopping at `next`.
    ///
    /// The parcel is brought down from `next` to each step.
    fn refine<F>(&self, next: &Point, keep_going: F) -> Result<Option<HectoPascal>>
    where
        F: Fn(Celsius, Celsius) -> bool,
    {
        let sat = &self.cfg.saturation;
        let mut p = self.prev.p;

        for _ in 0..self.cfg.max_search_steps {
            if p <= next.p {
                return Ok(Some(next.p));
            }

            let temps = soft(virtual_temperature_for_pressure(self.snd, p).and_then(|env_vt| {
                let pcl_t = thermo::wet_lift_with(next.p, next.pcl_t, p, sat)?;
                Ok((env_vt, thermo::virtual_temperature(p, pcl_t, pcl_t)?))
            }))?;

            match temps {
                Some((env_vt, pcl_vt)) if keep_going(env_vt, pcl_vt) => p = p - self.cfg.lfc_el_step,
                Some(_) => return Ok(Some(p)),
                None => return Ok(None),
            }
        }

        warn!(
            "LFC/EL refinement gave up between {:?} and {:?}",
            self.prev.p, next.p
        );
        Err(AnalysisError::Convergence {
            routine: "lfc_el_refinement",
            iterations: self.cfg.max_search_steps,
        })
    }

    fn mpl(&mut self, lyre: f64) -> Result<()> {
        if self.totals.since_lfc < 0.0 && self.found.mpl.is_none() && self.found.el.is_some() {
            self.found.mpl = self.search_mpl(lyre)?;
        }
        Ok(())
    }

    /// Step up from the previous level until the net energy above the LFC is used up.
    fn search_mpl(&self, lyre: f64) -> Result<Option<HectoPascal>> {
        let mut total = self.totals.since_lfc - lyre;
        let mut below = self.prev;

        for _ in 0..self.cfg.max_search_steps {
            if total <= 0.0 {
                return Ok(Some(below.p));
            }

            let p = below.p - self.cfg.mpl_step;
            let above = match soft(below.lift_to(self.snd, p, &self.cfg.saturation))? {
                Some(above) => above,
                None => return Ok(None),
            };

            total += layer_energy(&below, &above);
            below = above;
        }

        warn!("MPL search gave up at {:?}", below.p);
        Err(AnalysisError::Convergence {
            routine: "mpl_search",
            iterations: self.cfg.max_search_steps,
        })
    }

    fn lifted_indexes(&mut self, next: &Point) -> Result<()> {
        if self.found.li5.is_none() && next.p <= HectoPascal(500.0) {
            self.found.li5 = soft(self.lifted_index(HectoPascal(500.0)))?;
        }
        if self.found.li3.is_none() && next.p <= HectoPascal(300.0) {
            self.found.li3 = soft(self.lifted_index(HectoPascal(300.0)))?;
        }
        Ok(())
    }

    fn lifted_index(&self, p: HectoPascal) -> Result<f64> {
        let env_vt = virtual_temperature_for_pressure(self.snd, p)?;
        let pcl_t = thermo::wet_lift_with(self.prev.p, self.prev.pcl_t, p, &self.cfg.saturation)?;
        let pcl_vt = thermo::virtual_temperature(p, pcl_t, pcl_t)?;

        Ok((env_vt - pcl_vt).unpack())
    }

    fn finish(self, mut result: ParcelResult) -> Result<ParcelResult> {
        let snd = self.snd;
        let found = self.found;

        let (mut cape, mut cin) = found
            .layer
            .unwrap_or((self.totals.positive, self.totals.negative));
        if let Some(cin_at_lfc) = found.cin_at_lfc {
            cin = cin_at_lfc;
        }
        if cape <= 0.0 {
            cape = 0.0;
            cin = 0.0;
        }

        result.cape = some(JpKg(cape));
        result.cin = some(JpKg(cin));

        let joules = |val: Option<f64>| -> Optioned<JpKg> { val.map(JpKg).into() };
        result.cape_freezing = joules(found.cape_freezing);
        result.cape_m10c = joules(found.cape_m10c);
        result.cape_m20c = joules(found.cape_m20c);
        result.cape_m30c = joules(found.cape_m30c);
        result.cape_3km = joules(found.cape_3km);
        result.cape_6km = joules(found.cape_6km);

        let degrees = |val: Option<f64>| -> Optioned<CelsiusDiff> { val.map(CelsiusDiff).into() };
        result.li5 = degrees(found.li5);
        result.li3 = degrees(found.li3);
        result.li_max = degrees(found.li_max.map(|(li, _)| li));
        result.li_max_pressure = found.li_max.map(|(_, p)| p).into();
        result.cap_strength = degrees(found.cap.map(|(cap, _)| cap));
        result.cap_pressure = found.cap.map(|(_, p)| p).into();

        let level = |p: Option<HectoPascal>| -> Result<(Optioned<HectoPascal>, Optioned<Meters>)> {
            match p {
                Some(p) => Ok((some(p), soft(height_agl(snd, p))?.into())),
                None => Ok((optional::none(), optional::none())),
            }
        };
        let (lfc_pressure, lfc_height) = level(found.lfc)?;
        let (el_pressure, el_height) = level(found.el)?;
        let (mpl_pressure, mpl_height) = level(found.mpl)?;

        result.lfc_pressure = lfc_pressure;
        result.lfc_height = lfc_height;
        result.el_pressure = el_pressure;
        result.el_height = el_height;
        result.mpl_pressure = mpl_pressure;
        result.mpl_height = mpl_height;

        Ok(result)
    }
}
