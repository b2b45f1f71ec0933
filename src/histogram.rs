//! Weighted 1D histograms of analysis observables

use crate::{numeric::Float, Result};

use eyre::{ensure, format_err};
use prefix_num_ops::real::*;

/// Binning of the standard histograms, by observable name
///
/// Columns are name, axis title, number of bins, lower and upper edge.
///
#[rustfmt::skip]
const STANDARD_BINNINGS: &[(&str, &str, usize, Float, Float)] = &[
    // Leptonic W boson
    ("WtMass",              "Transverse mass of the W boson [GeV]",  40,    0.,  200.),
    ("etmiss",              "Missing transverse momentum [GeV]",     40,    0.,  200.),

    // Leptons
    ("lep_n",               "Number of leptons",                     10,  -0.5,   9.5),
    ("lep_pt",              "Lepton p_{T} [GeV]",                    40,    0.,  200.),
    ("lep_eta",             "Lepton #eta",                           30,   -3.,    3.),
    ("lep_E",               "Lepton energy [GeV]",                   40,    0.,  400.),
    ("lep_phi",             "Lepton #phi",                           32,  -3.2,   3.2),
    ("lep_charge",          "Lepton charge",                          3,  -1.5,   1.5),
    ("lep_type",            "Lepton type",                            3,  10.5,  13.5),
    ("lep_ptconerel30",     "Lepton relative track isolation",       40,    0.,   0.2),
    ("lep_etconerel20",     "Lepton relative calorimeter isolation", 40, -0.05,   0.2),
    ("lep_z0",              "Lepton z_{0} [mm]",                     40,   -1.,    1.),
    ("lep_d0",              "Lepton d_{0} [mm]",                     40,  -0.1,   0.1),

    // Jets
    ("n_jets",              "Number of jets",                        10,  -0.5,   9.5),
    ("n_jetsbefore",        "Number of jets",                        10,  -0.5,   9.5),
    ("jet_pt",              "Jet p_{T} [GeV]",                       40,    0.,  400.),
    ("jet_m",               "Jet mass [GeV]",                        40,    0.,   60.),
    ("jet_jvt",             "Jet vertex tagger score",               20,    0.,    1.),
    ("jet_eta",             "Jet #eta",                              30,   -3.,    3.),
    ("jet_MV2c10",          "Jet MV2c10 discriminant",               20,   -1.,    1.),
    ("jet_phi",             "Jet #phi",                              32,  -3.2,   3.2),

    // Event
    ("vxp_z",               "Primary vertex z [mm]",                 40, -200.,  200.),
    ("pvxp_n",              "Number of vertices",                    30,  -0.5,  29.5),

    // Single top
    ("SingleTopMass",       "Single top mass [GeV]",                 40,    0.,  400.),
    ("SingleTopMassbefore", "Single top mass [GeV]",                 40,    0.,  400.),
    ("jet_leta",            "Light jet #eta",                        30,   -3.,    3.),
    ("jet_letabefore",      "Light jet #eta",                        30,   -3.,    3.),
    ("delta_eta",           "|#Delta#eta(b, light jet)|",            30,    0.,    6.),
    ("delta_etabefore",     "|#Delta#eta(b, light jet)|",            30,    0.,    6.),
    ("ht",                  "H_{T} [GeV]",                           40,    0.,  800.),
    ("htbefore",            "H_{T} [GeV]",                           40,    0.,  800.),

    // Top pair
    ("TopMassRecbefore",    "Hadronic top mass [GeV]",               40,    0.,  600.),
    ("WtMassRecbefore",     "Hadronic W mass [GeV]",                 40,    0.,  300.),
    ("WtMassRec",           "Hadronic W mass [GeV]",                 40,    0.,  300.),
];

/// Weighted histogram with uniform binning
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    /// Observable name
    pub name: String,

    /// Axis title
    pub title: String,

    /// Lower edge of the first bin
    pub x_min: Float,

    /// Upper edge of the last bin
    pub x_max: Float,

    /// Sum of weights in each bin (excluding underflow/overflow)
    pub bin_content: Vec<Float>,

    /// Sum of squared weights in each bin
    pub sumw2: Vec<Float>,

    /// Sum of weights below the first bin
    pub underflow: Float,

    /// Sum of weights above the last bin (NaN values end up here too)
    pub overflow: Float,

    /// Number of fills
    pub entries: u64,
}
//
impl Histogram {
    /// Set up an empty histogram
    pub fn new(name: &str, title: &str, n_bins: usize, x_min: Float, x_max: Float) -> Self {
        assert!(n_bins > 0, "A histogram needs at least one bin");
        assert!(x_min < x_max, "Histogram range must not be empty");
        Self {
            name: name.to_owned(),
            title: title.to_owned(),
            x_min,
            x_max,
            bin_content: vec![0.; n_bins],
            sumw2: vec![0.; n_bins],
            underflow: 0.,
            overflow: 0.,
            entries: 0,
        }
    }

    /// Number of bins (excluding underflow/overflow)
    pub fn n_bins(&self) -> usize {
        self.bin_content.len()
    }

    /// Lower edge of a bin
    pub fn bin_low_edge(&self, bin: usize) -> Float {
        self.x_min + (self.x_max - self.x_min) * (bin as Float) / (self.n_bins() as Float)
    }

    /// Statistical uncertainty on a bin's content
    pub fn bin_error(&self, bin: usize) -> Float {
        sqrt(self.sumw2[bin])
    }

    /// Bin in which a value falls, or None for underflow and overflow
    pub fn find_bin(&self, value: Float) -> Option<usize> {
        if !(value >= self.x_min && value < self.x_max) {
            return None;
        }
        let relative = (value - self.x_min) / (self.x_max - self.x_min);
        let bin = (relative * self.n_bins() as Float) as usize;
        // Rounding may push values right below x_max into a nonexistent bin
        Some(bin.min(self.n_bins() - 1))
    }

    /// Record a weighted value
    pub fn fill(&mut self, value: Float, weight: Float) {
        self.entries += 1;
        match self.find_bin(value) {
            Some(bin) => {
                self.bin_content[bin] += weight;
                self.sumw2[bin] += weight.powi(2);
            }
            None if value < self.x_min => self.underflow += weight,
            None => self.overflow += weight,
        }
    }

    /// Sum of weights, including underflow and overflow
    pub fn integral(&self) -> Float {
        self.underflow + self.bin_content.iter().sum::<Float>() + self.overflow
    }

    /// Add the contents of an identically binned histogram
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(self.name, other.name, "Can only merge the same observable");
        assert_eq!(self.n_bins(), other.n_bins(), "Binnings should match");
        for (dst, src) in self.bin_content.iter_mut().zip(&other.bin_content) {
            *dst += src;
        }
        for (dst, src) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *dst += src;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
    }
}

/// Handle to a histogram of a HistogramSet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistId(usize);

/// Ordered collection of the histograms booked by an analysis
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramSet {
    histograms: Vec<Histogram>,
}
//
impl HistogramSet {
    /// Set up an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Book a histogram with the standard binning of some observable
    pub fn add_standard(&mut self, name: &str) -> Result<HistId> {
        ensure!(
            self.get(name).is_none(),
            "Histogram {} was booked twice",
            name
        );
        let &(_, title, n_bins, x_min, x_max) = STANDARD_BINNINGS
            .iter()
            .find(|binning| binning.0 == name)
            .ok_or_else(|| format_err!("No standard binning for histogram {}", name))?;
        self.histograms
            .push(Histogram::new(name, title, n_bins, x_min, x_max));
        Ok(HistId(self.histograms.len() - 1))
    }

    /// Record a weighted value in a histogram
    pub fn fill(&mut self, id: HistId, value: Float, weight: Float) {
        self.histograms[id.0].fill(value, weight);
    }

    /// Look up a histogram by observable name
    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.iter().find(|hist| hist.name == name)
    }

    /// Iterate over histograms in booking order
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        self.histograms.iter()
    }

    /// Add the contents of another collection with the same bookings
    pub fn merge(&mut self, other: &Self) {
        assert_eq!(
            self.histograms.len(),
            other.histograms.len(),
            "Histogram bookings should match"
        );
        for (dst, src) in self.histograms.iter_mut().zip(&other.histograms) {
            dst.merge(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fill_with_flows() {
        let mut hist = Histogram::new("h", "h", 3, 0., 3.);
        for value in [0.5, 1.5, 2.5, 0.5, -1., 3.5, 3., Float::NAN] {
            hist.fill(value, 1.);
        }
        assert_eq!(hist.bin_content, vec![2., 1., 1.]);
        assert_eq!(hist.underflow, 1.);
        assert_eq!(hist.overflow, 3.);
        assert_eq!(hist.entries, 8);
        assert_eq!(hist.integral(), 8.);
    }

    #[test]
    fn fill_with_weights() {
        let mut hist = Histogram::new("h", "h", 2, 0., 2.);
        hist.fill(0.5, 2.);
        hist.fill(1.5, 3.);
        hist.fill(0.5, 1.);
        assert_eq!(hist.bin_content, vec![3., 3.]);
        assert_eq!(hist.sumw2, vec![5., 9.]);
        assert_relative_eq!(hist.bin_error(0), (5. as Float).sqrt());
        assert_relative_eq!(hist.bin_low_edge(1), 1.);
    }

    #[test]
    fn find_bin_edges() {
        let hist = Histogram::new("h", "h", 40, 0., 200.);
        assert_eq!(hist.find_bin(0.), Some(0));
        assert_eq!(hist.find_bin(7.5), Some(1));
        assert_eq!(hist.find_bin(199.999), Some(39));
        assert_eq!(hist.find_bin(200.), None);
        assert_eq!(hist.find_bin(-0.001), None);
    }

    #[test]
    fn standard_bookings() {
        let mut set = HistogramSet::new();
        let id = set.add_standard("lep_pt").unwrap();
        assert!(set.add_standard("lep_pt").is_err());
        assert!(set.add_standard("not_an_observable").is_err());

        set.fill(id, 42., 0.5);
        let hist = set.get("lep_pt").unwrap();
        assert_eq!(hist.n_bins(), 40);
        assert_eq!(hist.entries, 1);
        assert_eq!(hist.bin_content[8], 0.5);
    }

    #[test]
    fn every_standard_binning_is_valid() {
        let mut set = HistogramSet::new();
        for binning in STANDARD_BINNINGS {
            set.add_standard(binning.0).unwrap();
        }
        assert_eq!(set.iter().count(), STANDARD_BINNINGS.len());
    }

    #[test]
    fn merge_adds_bin_contents() {
        let mut set1 = HistogramSet::new();
        let id = set1.add_standard("etmiss").unwrap();
        let mut set2 = set1.clone();
        set1.fill(id, 36., 1.);
        set2.fill(id, 36., 2.);
        set2.fill(id, 500., 1.);
        set1.merge(&set2);

        let hist = set1.get("etmiss").unwrap();
        assert_eq!(hist.bin_content[7], 3.);
        assert_eq!(hist.sumw2[7], 5.);
        assert_eq!(hist.overflow, 1.);
        assert_eq!(hist.entries, 3);
    }
}
