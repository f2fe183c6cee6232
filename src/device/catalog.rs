//! Graphics adapters observed on real Windows Chrome installs.

/// `(vendor, model)` pairs as reported by ANGLE.
pub const GRAPHIC_CARDS: &[(&str, &str)] = &[
    ("AMD", "AMD Radeon 780M Graphics (0x000015BF)"),
    ("AMD", "AMD Radeon RX 5700 (0x0000731F)"),
    ("AMD", "AMD Radeon RX 6500 XT (0x0000743F)"),
    ("AMD", "AMD Radeon RX 6600 (0x000073FF)"),
    ("AMD", "AMD Radeon RX 6750 GRE 10GB (0x000073FF)"),
    ("AMD", "AMD Radeon RX 6750 GRE 12GB (0x000073DF)"),
    ("AMD", "AMD Radeon RX 6750 XT (0x000073DF)"),
    ("AMD", "AMD Radeon RX 6800 XT (0x000073BF)"),
    ("AMD", "AMD Radeon RX 7600S (0x00007480)"),
    ("AMD", "AMD Radeon(TM) Graphics (0x00001636)"),
    ("AMD", "AMD Radeon(TM) Graphics (0x00001638)"),
    ("AMD", "AMD Radeon(TM) Graphics (0x00001681)"),
    ("AMD", "AMD Radeon(TM) Vega 6 Graphics (0x000015DD)"),
    ("Intel", "Intel(R) Arc(TM) A750 Graphics (0x000056A1)"),
    ("Intel", "Intel(R) Arc(TM) Graphics (0x00007D55)"),
    ("Intel", "Intel(R) HD Graphics (0x000022B1)"),
    ("Intel", "Intel(R) HD Graphics 4400 (0x0000041E)"),
    ("Intel", "Intel(R) HD Graphics 510 (0x00001902)"),
    ("Intel", "Intel(R) HD Graphics 520 (0x00001916)"),
    ("Intel", "Intel(R) HD Graphics 530 (0x00001912)"),
    ("Intel", "Intel(R) HD Graphics 530 (0x0000191B)"),
    ("Intel", "Intel(R) HD Graphics 5500 (0x00001616)"),
    ("Intel", "Intel(R) HD Graphics 6000 (0x00001626)"),
    ("Intel", "Intel(R) HD Graphics 610 (0x00005902)"),
    ("Intel", "Intel(R) HD Graphics 620 (0x00005916)"),
    ("Intel", "Intel(R) HD Graphics 630 (0x00005912)"),
    ("Intel", "Intel(R) HD Graphics 630 (0x0000591B)"),
    ("Intel", "Intel(R) Iris(R) Plus Graphics 640 (0x00005926)"),
    ("Intel", "Intel(R) Iris(R) Xe Graphics (0x000046A6)"),
    ("Intel", "Intel(R) Iris(R) Xe Graphics (0x000046A8)"),
    ("Intel", "Intel(R) Iris(R) Xe Graphics (0x0000A7A1)"),
    ("Intel", "Intel(R) UHD Graphics (0x000046A3)"),
    ("Intel", "Intel(R) UHD Graphics (0x00009A60)"),
    ("Intel", "Intel(R) UHD Graphics (0x00009B41)"),
    ("Intel", "Intel(R) UHD Graphics (0x00009BA4)"),
    ("Intel", "Intel(R) UHD Graphics (0x00009BC4)"),
    ("Intel", "Intel(R) UHD Graphics (0x0000A720)"),
    ("Intel", "Intel(R) UHD Graphics (0x0000A721)"),
    ("Intel", "Intel(R) UHD Graphics (0x0000A78B)"),
    ("Intel", "Intel(R) UHD Graphics 610 (0x00009BA8)"),
    ("Intel", "Intel(R) UHD Graphics 620 (0x00003EA0)"),
    ("Intel", "Intel(R) UHD Graphics 620 (0x00005917)"),
    ("Intel", "Intel(R) UHD Graphics 630 (0x00003E91)"),
    ("Intel", "Intel(R) UHD Graphics 630 (0x00003E92)"),
    ("Intel", "Intel(R) UHD Graphics 630 (0x00003E98)"),
    ("Intel", "Intel(R) UHD Graphics 630 (0x00009BC5)"),
    ("Intel", "Intel(R) UHD Graphics 730 (0x00004682)"),
    ("Intel", "Intel(R) UHD Graphics 730 (0x00004692)"),
    ("Intel", "Intel(R) UHD Graphics 750 (0x00004C8A)"),
    ("Intel", "Intel(R) UHD Graphics 770 (0x00004680)"),
    ("NVIDIA", "NVIDIA GeForce GT 710 (0x0000128B)"),
    ("NVIDIA", "NVIDIA GeForce GT 730 (0x00000F02)"),
    ("NVIDIA", "NVIDIA GeForce GT 730 (0x00001287)"),
    ("NVIDIA", "NVIDIA GeForce GT 1010 (0x00001D02)"),
    ("NVIDIA", "NVIDIA GeForce GTX 650 (0x00000FC6)"),
    ("NVIDIA", "NVIDIA GeForce GTX 750 (0x00001381)"),
    ("NVIDIA", "NVIDIA GeForce GTX 750 Ti (0x00001380)"),
    ("NVIDIA", "NVIDIA GeForce GTX 960 (0x00001401)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1050 (0x00001C81)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1050 Ti (0x00001C82)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1060 6GB (0x00001C03)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1070 (0x00001B81)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1650 Ti (0x00001F95)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1660 (0x00002184)"),
    ("NVIDIA", "NVIDIA GeForce GTX 1660 SUPER (0x000021C4)"),
    ("NVIDIA", "NVIDIA GeForce GTX 965M (0x00001427)"),
    ("NVIDIA", "NVIDIA GeForce RTX 2060 (0x00001F08)"),
    ("NVIDIA", "NVIDIA GeForce RTX 2070 SUPER (0x00001E84)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3050 (0x00002584)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 (0x00002504)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 (0x00002544)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 Laptop GPU (0x00002520)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 Laptop GPU (0x00002560)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 Ti (0x00002414)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 Ti (0x00002489)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3060 Ti (0x000024C9)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3070 (0x00002484)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3070 (0x00002488)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3080 (0x00002206)"),
    ("NVIDIA", "NVIDIA GeForce RTX 3080 Ti (0x00002208)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4050 Laptop GPU (0x000028E1)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4060 Laptop GPU (0x000028A0)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4060 Laptop GPU (0x000028E0)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4060 Ti (0x00002803)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4070 (0x00002786)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4070 Laptop GPU (0x00002820)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4070 SUPER (0x00002783)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4080 (0x00002704)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4080 SUPER (0x00002702)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4090 (0x00002684)"),
    ("NVIDIA", "NVIDIA GeForce RTX 4090 D (0x00002685)"),
    ("NVIDIA", "NVIDIA Quadro P2000 (0x00001C30)"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_known_vendors_only() {
        assert!(!GRAPHIC_CARDS.is_empty());
        for (vendor, model) in GRAPHIC_CARDS {
            assert!(matches!(*vendor, "AMD" | "Intel" | "NVIDIA"), "unexpected vendor {vendor}");
            assert!(model.ends_with(')'), "model without device id: {model}");
        }
    }
}
